//! Delivery errors and per-batch outcomes
//!
//! Categorized by retryability: network / server (transient), client / request (fatal).

use serde::Serialize;
use std::ops::Range;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    // ===== Transient network errors =====
    /// Could not establish a connection
    #[error("connection failed: {message}")]
    Connect { message: String },

    /// Connect or read timed out
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Connection reset, protocol or body transfer failure
    #[error("transport error: {message}")]
    Transport { message: String },

    // ===== Application errors =====
    /// 5xx response
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    /// 4xx response, or any other non-success status
    #[error("client error {status}: {body}")]
    Client { status: u16, body: String },

    /// Request could not be built or sent as HTTP
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Anything else raised during the attempt
    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl DeliveryError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect { .. }
            | Self::Timeout { .. }
            | Self::Transport { .. }
            | Self::Server { .. }
            | Self::Unexpected { .. } => true,
            Self::Client { .. } | Self::InvalidRequest { .. } => false,
        }
    }

    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::Server { .. } => "server",
            Self::Client { .. } => "client",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Unexpected { .. } => "unexpected",
        }
    }

    /// HTTP status, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}

/// Acknowledged delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Response status code (2xx)
    pub status: u16,
}

/// Terminal state of one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Acknowledged by the endpoint
    Succeeded,
    /// Non-retryable failure; no further attempts were made
    Rejected(DeliveryError),
    /// Retry budget used up; carries the last observed error
    Exhausted(DeliveryError),
    /// The unit delivering the batch panicked or was cancelled
    Aborted(String),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn error(&self) -> Option<&DeliveryError> {
        match self {
            Self::Rejected(e) | Self::Exhausted(e) => Some(e),
            Self::Succeeded | Self::Aborted(_) => None,
        }
    }

    /// Failure class, `None` on success
    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            Self::Succeeded => None,
            Self::Rejected(_) => Some(FailureClass::Rejected),
            Self::Exhausted(_) => Some(FailureClass::Exhausted),
            Self::Aborted(_) => Some(FailureClass::Aborted),
        }
    }

    /// Human-readable failure detail, `None` on success
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Succeeded => None,
            Self::Rejected(e) | Self::Exhausted(e) => Some(e.to_string()),
            Self::Aborted(reason) => Some(reason.clone()),
        }
    }
}

/// Failure class reported for a failed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Rejected,
    Exhausted,
    Aborted,
}

/// Outcome of one batch, reconciled to its identity
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch_index: usize,
    pub record_range: Range<usize>,
    /// Number of delivery calls made (1..=max_retries + 1)
    pub attempts: u32,
    /// Wall time from first attempt to terminal state, backoff included
    pub elapsed: Duration,
    pub outcome: DeliveryOutcome,
}

impl BatchOutcome {
    pub fn record_count(&self) -> usize {
        self.record_range.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(DeliveryError::Timeout {
            message: "read".into()
        }
        .is_retryable());
        assert!(DeliveryError::Server {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(DeliveryError::unexpected("boom").is_retryable());
        assert!(!DeliveryError::Client {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!DeliveryError::InvalidRequest {
            message: "bad url".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_outcome_error() {
        let err = DeliveryError::Client {
            status: 422,
            body: "bad".into(),
        };
        assert_eq!(err.status(), Some(422));
        let outcome = DeliveryOutcome::Rejected(err.clone());
        assert_eq!(outcome.error(), Some(&err));
        assert!(DeliveryOutcome::Succeeded.error().is_none());
        assert_eq!(outcome.failure_class(), Some(FailureClass::Rejected));
        assert_eq!(outcome.detail().as_deref(), Some("client error 422: bad"));
        assert_eq!(DeliveryOutcome::Succeeded.failure_class(), None);
    }
}
