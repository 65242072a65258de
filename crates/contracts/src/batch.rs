//! Batch - Batcher output, Sender input

use std::ops::Range;

use crate::Record;

/// Contiguous slice of the record sequence, delivered as one request
#[derive(Debug, Clone)]
pub struct Batch {
    /// Position of the batch in input order (0-based)
    pub index: usize,

    /// Offset of the first record in the original sequence
    pub start: usize,

    /// Records in input order
    pub records: Vec<Record>,
}

impl Batch {
    pub fn new(index: usize, start: usize, records: Vec<Record>) -> Self {
        Self {
            index,
            start,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index range of this batch in the original record sequence
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.records.len()
    }
}
