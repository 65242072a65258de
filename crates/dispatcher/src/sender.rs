//! BatchSender - deliver one batch with retries

use std::sync::Arc;

use contracts::{
    Batch, BatchOutcome, BatchPayload, BatchTransport, DeliveryError, DeliveryOutcome,
};
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::metrics::DispatchMetrics;
use crate::retry::{retry_with_backoff, RetryError, RetryPolicy};

/// Sends batches through a transport, retrying transient failures
///
/// Every call to [`BatchSender::send`] ends in exactly one [`BatchOutcome`].
pub struct BatchSender<T> {
    transport: Arc<T>,
    policy: RetryPolicy,
    payload_field: String,
    metrics: Arc<DispatchMetrics>,
}

impl<T: BatchTransport + Sync> BatchSender<T> {
    pub fn new(transport: Arc<T>, policy: RetryPolicy, payload_field: impl Into<String>) -> Self {
        Self {
            transport,
            policy,
            payload_field: payload_field.into(),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Share counters with the owning dispatcher
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    #[instrument(
        name = "batch_sender_send",
        skip(self, batch),
        fields(batch = batch.index, records = batch.len(), transport = self.transport.name())
    )]
    pub async fn send(&self, batch: &Batch) -> BatchOutcome {
        let started = Instant::now();

        let payload = match BatchPayload::encode(&self.payload_field, batch) {
            Ok(payload) => payload,
            Err(e) => {
                let err = DeliveryError::InvalidRequest {
                    message: e.to_string(),
                };
                error!(batch = batch.index, error = %err, "Batch payload could not be encoded");
                return self.finish(batch, 0, started, DeliveryOutcome::Rejected(err));
            }
        };

        let max_attempts = self.policy.max_attempts();
        let transport = &self.transport;
        let metrics = &self.metrics;
        let payload = &payload;

        let retried = retry_with_backoff(&self.policy, DeliveryError::is_retryable, move |attempt| {
            async move {
                metrics.inc_attempts();
                observability::record_attempt();

                let result = transport.deliver(payload).await;
                if let Err(e) = &result {
                    warn!(
                        batch = batch.index,
                        attempt = attempt + 1,
                        max_attempts,
                        kind = e.kind(),
                        error = %e,
                        "Delivery attempt failed"
                    );
                }
                result
            }
        })
        .await;

        let outcome = match retried.result {
            Ok(receipt) => {
                info!(
                    batch = batch.index,
                    records = batch.len(),
                    status = receipt.status,
                    attempts = retried.attempts,
                    "Batch delivered"
                );
                DeliveryOutcome::Succeeded
            }
            Err(RetryError::Rejected(e)) => {
                error!(
                    batch = batch.index,
                    records = batch.len(),
                    attempts = retried.attempts,
                    error = %e,
                    "Batch rejected"
                );
                DeliveryOutcome::Rejected(e)
            }
            Err(RetryError::Exhausted(e)) => {
                error!(
                    batch = batch.index,
                    records = batch.len(),
                    attempts = retried.attempts,
                    error = %e,
                    "Batch failed after retries"
                );
                DeliveryOutcome::Exhausted(e)
            }
        };

        self.finish(batch, retried.attempts, started, outcome)
    }

    fn finish(
        &self,
        batch: &Batch,
        attempts: u32,
        started: Instant,
        outcome: DeliveryOutcome,
    ) -> BatchOutcome {
        self.metrics.add_retries(u64::from(attempts.saturating_sub(1)));
        if outcome.is_success() {
            self.metrics.inc_succeeded();
        } else {
            self.metrics.inc_failed();
        }

        let outcome = BatchOutcome {
            batch_index: batch.index,
            record_range: batch.range(),
            attempts,
            elapsed: started.elapsed(),
            outcome,
        };
        observability::record_batch_outcome(&outcome);
        outcome
    }
}
