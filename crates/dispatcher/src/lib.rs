//! # Dispatcher
//!
//! Batched delivery engine.
//!
//! Responsibilities:
//! - split records into ordered batches
//! - deliver batches concurrently under a fixed limit
//! - retry transient failures with capped exponential backoff
//! - reconcile every batch into a `RunReport`

pub mod batcher;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod report;
pub mod retry;
pub mod sender;
pub mod transport;

#[cfg(test)]
mod mock;

pub use batcher::Batcher;
pub use contracts::{Batch, BatchOutcome, BatchTransport};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherConfig};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use report::{BatchFailure, RunReport};
pub use retry::{retry_with_backoff, RetryError, RetryOutcome, RetryPolicy};
pub use sender::BatchSender;
pub use transport::{classify_status, HttpTransport};
