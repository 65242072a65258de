//! RunReport - per-run summary of failed batches

use std::fmt;
use std::time::Duration;

use contracts::{BatchOutcome, FailureClass};
use serde::Serialize;

/// One failed batch, identified by its position in the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub batch_index: usize,
    /// First record offset (inclusive)
    pub record_start: usize,
    /// Last record offset (exclusive)
    pub record_end: usize,
    pub attempts: u32,
    pub class: FailureClass,
    /// HTTP status of the last response, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub error: String,
}

impl BatchFailure {
    pub fn record_count(&self) -> usize {
        self.record_end - self.record_start
    }
}

/// Outcome of a whole dispatch run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub total_records: usize,
    pub total_batches: usize,
    pub succeeded_batches: usize,
    /// Ordered by batch index
    pub failed_batches: Vec<BatchFailure>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl RunReport {
    /// Build the report; failures are sorted by batch index
    pub fn from_outcomes(outcomes: &[BatchOutcome], elapsed: Duration) -> Self {
        let mut failed_batches: Vec<BatchFailure> = outcomes
            .iter()
            .filter_map(|o| {
                let class = o.outcome.failure_class()?;
                Some(BatchFailure {
                    batch_index: o.batch_index,
                    record_start: o.record_range.start,
                    record_end: o.record_range.end,
                    attempts: o.attempts,
                    class,
                    status: o.outcome.error().and_then(|e| e.status()),
                    error: o.outcome.detail().unwrap_or_default(),
                })
            })
            .collect();
        failed_batches.sort_by_key(|f| f.batch_index);

        Self {
            total_records: outcomes.iter().map(BatchOutcome::record_count).sum(),
            total_batches: outcomes.len(),
            succeeded_batches: outcomes.len() - failed_batches.len(),
            failed_batches,
            elapsed,
        }
    }

    /// True when every batch was delivered (vacuously true for no batches)
    pub fn is_success(&self) -> bool {
        self.failed_batches.is_empty()
    }

    pub fn failed_records(&self) -> usize {
        self.failed_batches.iter().map(BatchFailure::record_count).sum()
    }

    pub fn delivered_records(&self) -> usize {
        self.total_records - self.failed_records()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Report ===")?;
        writeln!(
            f,
            "Batches: {} total, {} succeeded, {} failed",
            self.total_batches,
            self.succeeded_batches,
            self.failed_batches.len()
        )?;
        writeln!(
            f,
            "Records: {} total, {} delivered, {} failed",
            self.total_records,
            self.delivered_records(),
            self.failed_records()
        )?;
        writeln!(f, "Elapsed: {:.2}s", self.elapsed.as_secs_f64())?;

        if !self.failed_batches.is_empty() {
            writeln!(f, "Failed batches:")?;
            for failure in &self.failed_batches {
                writeln!(
                    f,
                    "  #{} records [{}, {}) {:?} after {} attempt(s): {}",
                    failure.batch_index,
                    failure.record_start,
                    failure.record_end,
                    failure.class,
                    failure.attempts,
                    failure.error
                )?;
            }
        }

        Ok(())
    }
}
