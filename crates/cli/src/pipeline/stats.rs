//! Pipeline statistics and summary output.

use std::time::Duration;

use dispatcher::{MetricsSnapshot, RunReport};
use ingestion::TransformStats;
use observability::DeliverySummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Row counters from the transform
    pub transform: TransformStats,

    pub transform_elapsed: Duration,

    /// Number of batches produced
    pub batches: usize,

    pub dispatch_elapsed: Duration,

    /// Dispatcher counters (None on dry run)
    pub dispatch: Option<MetricsSnapshot>,

    /// Aggregated delivery statistics (None on dry run)
    pub delivery: Option<DeliverySummary>,

    /// Per-batch failure report (None on dry run)
    pub report: Option<RunReport>,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Records delivered per second of dispatch time
    pub fn throughput(&self) -> f64 {
        let delivered = self
            .report
            .as_ref()
            .map_or(0, RunReport::delivered_records);
        if self.dispatch_elapsed.as_secs_f64() > 0.0 {
            delivered as f64 / self.dispatch_elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Transform ===");
        println!("   Rows read:        {}", self.transform.rows_read);
        println!("   Invalid IP:       {}", self.transform.invalid_ip);
        println!("   Incomplete:       {}", self.transform.incomplete);
        println!("   Filtered out:     {}", self.transform.filtered_out);
        println!("   Records emitted:  {}", self.transform.emitted);
        println!("   Batches:          {}", self.batches);
        println!("   Elapsed:          {:.2}s", self.transform_elapsed.as_secs_f64());

        if let Some(ref summary) = self.delivery {
            println!();
            print!("{}", summary);
        }

        if let Some(ref dispatch) = self.dispatch {
            println!("Retries: {}", dispatch.retries);
            println!("Peak in flight: {}", dispatch.peak_in_flight);
            println!("Throughput: {:.1} records/s", self.throughput());
        }

        if let Some(ref report) = self.report {
            println!();
            print!("{}", report);
        }

        println!("\nTotal duration: {:.2}s\n", self.duration.as_secs_f64());
    }
}
