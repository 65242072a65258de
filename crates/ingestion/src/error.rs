//! Ingestion error types

use thiserror::Error;

/// Ingestion error
///
/// Every variant aborts the run before dispatch starts.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Input file could not be opened
    #[error("failed to read input '{path}': {source}")]
    Io {
        /// Input path
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV could not be parsed
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Required column absent from the header
    #[error("input must contain a '{column}' column")]
    MissingColumn {
        /// Column name
        column: String,
    },

    /// Filter expression is not `key=value`
    #[error("filter must be in the form key=value, got '{expression}'")]
    InvalidFilter {
        /// Raw expression
        expression: String,
    },

    /// Filter key is not a column of the cleaned data
    #[error("filter key '{key}' not in columns: {columns:?}")]
    UnknownFilterKey {
        /// Filter key
        key: String,
        /// Available columns
        columns: Vec<String>,
    },
}

impl IngestionError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
