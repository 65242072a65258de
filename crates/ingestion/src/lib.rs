//! # Ingestion
//!
//! Upstream record transform.
//!
//! Responsibilities:
//! - Read the delimited input file (header row required)
//! - Canonicalize categories, validate IP addresses
//! - Drop invalid/incomplete rows and unused columns
//! - Apply the optional `key=value` filter
//!
//! Every failure happens before dispatch starts.
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::RecordSource;
//! use ingestion::CsvRecordSource;
//!
//! let source = CsvRecordSource::new("activity.csv").with_filter(Some("category=phishing".into()));
//! let records = source.produce()?;
//! ```

pub mod category;
mod error;
mod filter;
mod source;
mod transform;

// Re-exports
pub use contracts::Record;
pub use error::{IngestionError, Result};
pub use filter::FilterExpr;
pub use source::CsvRecordSource;
pub use transform::{is_valid_ip, transform, Table, TransformOutput, TransformStats};
