//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Only construction can fail; delivery failures are reported per batch.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Invalid batching, concurrency or endpoint setting
    #[error("invalid dispatcher config '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// HTTP client could not be constructed
    #[error("failed to build http client: {message}")]
    ClientBuild { message: String },
}

impl DispatcherError {
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
