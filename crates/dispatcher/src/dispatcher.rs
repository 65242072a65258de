//! Dispatcher - bounded-concurrency delivery of all batches

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use contracts::{Batch, BatchOutcome, BatchTransport, DeliveryOutcome, LoaderConfig};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::report::RunReport;
use crate::retry::RetryPolicy;
use crate::sender::BatchSender;
use crate::transport::HttpTransport;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum batches in flight
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// JSON field wrapping the record array
    pub payload_field: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from_loader_config(&LoaderConfig::default())
    }
}

impl DispatcherConfig {
    pub fn from_loader_config(config: &LoaderConfig) -> Self {
        Self {
            concurrency: config.delivery.concurrency,
            retry: RetryPolicy::from_config(&config.retry),
            payload_field: config.endpoint.payload_field.clone(),
        }
    }
}

/// Delivers batches concurrently, at most `concurrency` at a time
///
/// A batch holds its slot across every attempt and backoff sleep. Dropping a
/// running `dispatch` future aborts all in-flight deliveries.
pub struct Dispatcher<T> {
    sender: Arc<BatchSender<T>>,
    concurrency: usize,
    metrics: Arc<DispatchMetrics>,
}

impl<T> Dispatcher<T>
where
    T: BatchTransport + Sync + 'static,
{
    /// # Errors
    /// `InvalidConfig` when `concurrency` is zero.
    pub fn new(transport: T, config: DispatcherConfig) -> Result<Self, DispatcherError> {
        Self::with_shared_transport(Arc::new(transport), config)
    }

    /// Build over a transport the caller keeps a handle to
    pub fn with_shared_transport(
        transport: Arc<T>,
        config: DispatcherConfig,
    ) -> Result<Self, DispatcherError> {
        if config.concurrency == 0 {
            return Err(DispatcherError::invalid_config(
                "concurrency",
                "must be at least 1",
            ));
        }

        let metrics = Arc::new(DispatchMetrics::new());
        let sender = BatchSender::new(transport, config.retry, config.payload_field)
            .with_metrics(Arc::clone(&metrics));

        Ok(Self {
            sender: Arc::new(sender),
            concurrency: config.concurrency,
            metrics,
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Deliver every batch and summarize the run
    pub async fn run(&self, batches: Vec<Batch>) -> RunReport {
        self.run_observed(batches, |_| {}).await
    }

    /// Like [`Dispatcher::run`], handing each outcome to `observe` in batch
    /// order before the report is built
    pub async fn run_observed<F>(&self, batches: Vec<Batch>, mut observe: F) -> RunReport
    where
        F: FnMut(&BatchOutcome),
    {
        let started = Instant::now();
        let outcomes = self.dispatch(batches).await;
        outcomes.iter().for_each(&mut observe);
        let report = RunReport::from_outcomes(&outcomes, started.elapsed());
        observability::record_run_report(
            report.total_batches,
            report.failed_batches.len(),
            report.elapsed,
        );
        report
    }

    /// Deliver every batch; returns one outcome per batch, ordered by index
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, batches),
        fields(batches = batches.len(), concurrency = self.concurrency)
    )]
    pub async fn dispatch(&self, batches: Vec<Batch>) -> Vec<BatchOutcome> {
        let total = batches.len();
        info!(batches = total, concurrency = self.concurrency, "Dispatch started");

        let slots = Arc::new(Semaphore::new(self.concurrency));
        let mut units: JoinSet<BatchOutcome> = JoinSet::new();
        let mut identities: HashMap<Id, (usize, Range<usize>)> = HashMap::with_capacity(total);
        let mut outcomes = Vec::with_capacity(total);

        for batch in batches {
            let permit = match Arc::clone(&slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    outcomes.push(self.aborted(batch.index, batch.range(), "concurrency gate closed"));
                    continue;
                }
            };

            let identity = (batch.index, batch.range());
            let sender = Arc::clone(&self.sender);
            let slot = Slot::enter(Arc::clone(&self.metrics), permit);
            let handle = units.spawn(async move {
                let _slot = slot;
                sender.send(&batch).await
            });
            identities.insert(handle.id(), identity);

            while let Some(joined) = units.try_join_next_with_id() {
                if let Some(outcome) = self.reconcile(joined, &mut identities) {
                    outcomes.push(outcome);
                }
            }
        }

        while let Some(joined) = units.join_next_with_id().await {
            if let Some(outcome) = self.reconcile(joined, &mut identities) {
                outcomes.push(outcome);
            }
        }

        outcomes.sort_by_key(|o| o.batch_index);

        let failed = outcomes.iter().filter(|o| !o.outcome.is_success()).count();
        info!(
            batches = total,
            succeeded = total - failed,
            failed,
            peak_in_flight = self.metrics.peak_in_flight(),
            "Dispatch complete"
        );
        outcomes
    }

    fn reconcile(
        &self,
        joined: Result<(Id, BatchOutcome), JoinError>,
        identities: &mut HashMap<Id, (usize, Range<usize>)>,
    ) -> Option<BatchOutcome> {
        match joined {
            Ok((id, outcome)) => {
                identities.remove(&id);
                debug!(batch = outcome.batch_index, "Delivery unit finished");
                Some(outcome)
            }
            Err(e) => {
                let Some((index, range)) = identities.remove(&e.id()) else {
                    error!(error = %e, "Untracked delivery unit failed");
                    return None;
                };
                let reason = if e.is_panic() {
                    "delivery task panicked"
                } else {
                    "delivery task cancelled"
                };
                Some(self.aborted(index, range, reason))
            }
        }
    }

    fn aborted(&self, index: usize, range: Range<usize>, reason: &str) -> BatchOutcome {
        error!(batch = index, records = range.len(), reason, "Batch aborted");
        self.metrics.inc_failed();

        let outcome = BatchOutcome {
            batch_index: index,
            record_range: range,
            attempts: 0,
            elapsed: Duration::ZERO,
            outcome: DeliveryOutcome::Aborted(reason.to_string()),
        };
        observability::record_batch_outcome(&outcome);
        outcome
    }
}

/// Concurrency slot held by one delivery unit
///
/// The in-flight count drops before the permit is returned.
struct Slot {
    metrics: Arc<DispatchMetrics>,
    _permit: OwnedSemaphorePermit,
}

impl Slot {
    fn enter(metrics: Arc<DispatchMetrics>, permit: OwnedSemaphorePermit) -> Self {
        observability::record_in_flight(metrics.enter_slot());
        Self {
            metrics,
            _permit: permit,
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        observability::record_in_flight(self.metrics.exit_slot());
    }
}

/// Convenience function to create an HTTP dispatcher from the run config
#[instrument(name = "dispatcher_create", skip(config))]
pub fn create_dispatcher(config: &LoaderConfig) -> Result<Dispatcher<HttpTransport>, DispatcherError> {
    let transport = HttpTransport::new(&config.endpoint, &config.http)?;
    Dispatcher::new(transport, DispatcherConfig::from_loader_config(config))
}
