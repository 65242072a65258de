//! Batcher - split the record sequence into ordered batches

use std::num::NonZeroUsize;

use contracts::{Batch, Record};
use tracing::debug;

use crate::error::DispatcherError;

/// Partitions records into contiguous, order-preserving batches
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    batch_size: NonZeroUsize,
}

impl Batcher {
    /// # Errors
    /// `InvalidConfig` when `batch_size` is zero.
    pub fn new(batch_size: usize) -> Result<Self, DispatcherError> {
        let batch_size = NonZeroUsize::new(batch_size)
            .ok_or_else(|| DispatcherError::invalid_config("batch_size", "must be at least 1"))?;
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Number of batches `records` records split into
    pub fn batch_count(&self, records: usize) -> usize {
        records.div_ceil(self.batch_size.get())
    }

    /// Split into batches of `batch_size`; only the last may be shorter.
    /// An empty input yields no batches.
    pub fn split(&self, records: Vec<Record>) -> Vec<Batch> {
        let size = self.batch_size.get();
        let total = records.len();
        let mut batches = Vec::with_capacity(self.batch_count(total));
        let mut remaining = records.into_iter();
        let mut start = 0;

        loop {
            let chunk: Vec<Record> = remaining.by_ref().take(size).collect();
            if chunk.is_empty() {
                break;
            }
            let len = chunk.len();
            batches.push(Batch::new(batches.len(), start, chunk));
            start += len;
        }

        debug!(records = total, batches = batches.len(), batch_size = size, "Records batched");
        batches
    }
}
