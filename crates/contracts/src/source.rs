//! RecordSource trait - upstream record producer
//!
//! Reads, validates and cleans the input before any delivery starts.

use crate::Record;

/// Finite, ordered source of cleaned records
pub trait RecordSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce the full cleaned record sequence
    ///
    /// # Errors
    /// Structured error for missing required fields, malformed filter
    /// expressions or unreadable input.
    fn produce(&self) -> Result<Vec<Record>, Self::Error>;
}
