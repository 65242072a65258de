//! 投递指标收集模块
//!
//! 记录每次尝试、退避与批次结果；未安装 recorder 时所有调用均为空操作。

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::{BatchOutcome, DeliveryOutcome};
use metrics::{counter, gauge, histogram};

/// 记录一次投递尝试
pub fn record_attempt() {
    counter!("activity_loader_attempts_total").increment(1);
}

/// 记录一次退避重试
pub fn record_retry(delay: Duration) {
    counter!("activity_loader_retries_total").increment(1);
    histogram!("activity_loader_backoff_ms").record(delay.as_secs_f64() * 1000.0);
}

/// 记录批次终态
pub fn record_batch_outcome(outcome: &BatchOutcome) {
    let status = match &outcome.outcome {
        DeliveryOutcome::Succeeded => "succeeded",
        DeliveryOutcome::Rejected(_) => "rejected",
        DeliveryOutcome::Exhausted(_) => "exhausted",
        DeliveryOutcome::Aborted(_) => "aborted",
    };
    counter!("activity_loader_batches_total", "status" => status).increment(1);
    histogram!("activity_loader_batch_attempts").record(f64::from(outcome.attempts));
    histogram!("activity_loader_batch_latency_ms").record(outcome.elapsed.as_secs_f64() * 1000.0);

    if outcome.outcome.is_success() {
        counter!("activity_loader_records_delivered_total")
            .increment(outcome.record_count() as u64);
    }
}

/// 记录当前在途批次数
pub fn record_in_flight(in_flight: usize) {
    gauge!("activity_loader_batches_in_flight").set(in_flight as f64);
}

/// 记录整次运行的汇总
pub fn record_run_report(total_batches: usize, failed_batches: usize, elapsed: Duration) {
    gauge!("activity_loader_run_batches").set(total_batches as f64);
    gauge!("activity_loader_run_failed_batches").set(failed_batches as f64);
    gauge!("activity_loader_run_duration_seconds").set(elapsed.as_secs_f64());
}

/// 投递指标聚合器
///
/// 在内存中聚合批次结果，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DeliveryAggregator {
    /// 批次总数
    pub total_batches: u64,

    /// 成功批次数
    pub succeeded: u64,

    /// 成功投递的记录数
    pub records_delivered: u64,

    /// 尝试总数
    pub total_attempts: u64,

    /// 批次耗时 (毫秒)
    latency_ms: Spread,

    /// 每批尝试次数
    attempts_per_batch: Spread,

    /// 按失败类型计数
    pub failure_counts: BTreeMap<&'static str, u64>,
}

impl DeliveryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, outcome: &BatchOutcome) {
        self.total_batches += 1;
        self.total_attempts += u64::from(outcome.attempts);
        self.latency_ms.push(outcome.elapsed.as_secs_f64() * 1000.0);
        self.attempts_per_batch.push(f64::from(outcome.attempts));

        match &outcome.outcome {
            DeliveryOutcome::Succeeded => {
                self.succeeded += 1;
                self.records_delivered += outcome.record_count() as u64;
            }
            DeliveryOutcome::Rejected(e) | DeliveryOutcome::Exhausted(e) => {
                *self.failure_counts.entry(e.kind()).or_insert(0) += 1;
            }
            DeliveryOutcome::Aborted(_) => {
                *self.failure_counts.entry("aborted").or_insert(0) += 1;
            }
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DeliverySummary {
        DeliverySummary {
            total_batches: self.total_batches,
            succeeded: self.succeeded,
            failed: self.total_batches - self.succeeded,
            records_delivered: self.records_delivered,
            total_attempts: self.total_attempts,
            success_rate: if self.total_batches > 0 {
                self.succeeded as f64 / self.total_batches as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: self.latency_ms.summary(),
            attempts: self.attempts_per_batch.summary(),
            failure_counts: self.failure_counts.clone(),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    pub total_batches: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub records_delivered: u64,
    pub total_attempts: u64,
    pub success_rate: f64,
    pub latency_ms: StatsSummary,
    pub attempts: StatsSummary,
    pub failure_counts: BTreeMap<&'static str, u64>,
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Delivery Summary ===")?;
        writeln!(
            f,
            "Batches: {} ({} succeeded, {} failed, {:.2}% success)",
            self.total_batches, self.succeeded, self.failed, self.success_rate
        )?;
        writeln!(f, "Records delivered: {}", self.records_delivered)?;
        writeln!(f, "Attempts: {}", self.total_attempts)?;
        writeln!(f, "Attempts per batch: {}", self.attempts)?;
        writeln!(f, "Batch latency (ms): {}", self.latency_ms)?;

        if !self.failure_counts.is_empty() {
            writeln!(f, "Failures by kind:")?;
            for (kind, count) in &self.failure_counts {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 单遍累积 min/max/均值/样本标准差 (Welford)
#[derive(Debug, Clone, Default)]
struct Spread {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Spread {
    fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn summary(&self) -> StatsSummary {
        let std_dev = if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        };
        StatsSummary {
            count: self.count,
            min: self.min,
            max: self.max,
            mean: self.mean,
            std_dev,
        }
    }
}
