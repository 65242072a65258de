//! # Observability
//!
//! 可观测性模块：Prometheus 指标导出与投递统计。
//!
//! ## 功能
//!
//! - Prometheus 指标导出（可选端口）
//! - 批次投递指标记录（尝试、重试、结果、并发）
//! - 运行期间的内存聚合与摘要
//!
//! ## 使用示例
//!
//! ```ignore
//! observability::init_metrics_only(9000)?;
//!
//! let outcome = sender.send(&batch).await;
//! observability::record_batch_outcome(&outcome);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;

pub use crate::metrics::{
    record_attempt, record_batch_outcome, record_in_flight, record_retry, record_run_report,
    DeliveryAggregator, DeliverySummary, StatsSummary,
};

/// 仅初始化 Prometheus 指标（Tracing 由 CLI 初始化）
///
/// 在 `0.0.0.0:port` 暴露抓取端点。
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
