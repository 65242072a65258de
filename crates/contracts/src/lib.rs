//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Flow
//! - `RecordSource` produces an ordered `Vec<Record>`
//! - the batcher partitions it into `Batch`es
//! - a `BatchTransport` delivers one `BatchPayload` per attempt
//! - every batch ends in a `BatchOutcome`

mod batch;
mod config;
mod delivery;
mod error;
mod record;
mod source;
mod transport;

pub use batch::*;
pub use config::*;
pub use delivery::*;
pub use error::*;
pub use record::*;
pub use source::RecordSource;
pub use transport::*;
