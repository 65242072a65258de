//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Input file could not be read or transformed
    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] ingestion::IngestionError),

    /// Dispatcher could not be constructed
    #[error("Dispatcher setup failed: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),

    /// At least one batch was not delivered
    #[error("{failed} of {total} batches failed ({records} records not delivered)")]
    DeliveryFailed {
        failed: usize,
        total: usize,
        records: usize,
    },

    /// Run cancelled by a shutdown signal
    #[error("Interrupted before all batches completed")]
    Interrupted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
