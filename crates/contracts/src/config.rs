//! LoaderConfig - Config Loader output
//!
//! Describes the complete run configuration: endpoint, batching, retry policy,
//! HTTP client limits and input parsing.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Complete run configuration
///
/// Every section is optional in the file; missing values take the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoaderConfig {
    /// Ingestion endpoint
    #[validate(nested)]
    pub endpoint: EndpointConfig,

    /// Batching and concurrency
    #[validate(nested)]
    pub delivery: DeliveryConfig,

    /// Per-batch retry policy
    #[validate(nested)]
    pub retry: RetryConfig,

    /// HTTP client timeouts and pool limits
    #[validate(nested)]
    pub http: HttpClientConfig,

    /// Input file parsing
    pub input: InputConfig,
}

/// Endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EndpointConfig {
    /// POST target
    #[validate(url)]
    pub url: String,

    /// Static authorization token
    pub auth_token: String,

    /// Optional scheme prefix for the Authorization header (e.g. "Bearer")
    pub auth_scheme: Option<String>,

    /// Name of the JSON field holding the record array
    #[validate(length(min = 1))]
    pub payload_field: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/private/v1/ingest".to_string(),
            auth_token: String::new(),
            auth_scheme: None,
            payload_field: "activityRecordList".to_string(),
        }
    }
}

impl EndpointConfig {
    /// Value of the Authorization header
    pub fn authorization(&self) -> String {
        match self.auth_scheme.as_deref() {
            Some(scheme) if !scheme.is_empty() => format!("{} {}", scheme, self.auth_token),
            _ => self.auth_token.clone(),
        }
    }
}

/// Batching configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Records per request
    #[validate(range(min = 1))]
    pub batch_size: usize,

    /// Maximum batches in flight
    #[validate(range(min = 1))]
    pub concurrency: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            concurrency: 10,
        }
    }
}

/// Retry/backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,

    /// Backoff base in milliseconds
    pub base_delay_ms: u64,

    /// Cap per backoff sleep in milliseconds
    #[validate(range(min = 1))]
    pub max_delay_ms: u64,

    /// Upper bound of the random jitter added to each backoff
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 7,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            jitter_ms: 250,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HttpClientConfig {
    #[validate(range(min = 1))]
    pub connect_timeout_ms: u64,

    #[validate(range(min = 1))]
    pub read_timeout_ms: u64,

    #[validate(range(min = 1))]
    pub write_timeout_ms: u64,

    /// Wait for a pooled connection
    #[validate(range(min = 1))]
    pub pool_timeout_ms: u64,

    /// Maximum pooled connections per host
    #[validate(range(min = 1))]
    pub max_connections: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
            pool_timeout_ms: 5_000,
            max_connections: 100,
        }
    }
}

impl HttpClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_timeout_ms)
    }
}

/// Input parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Field delimiter
    pub delimiter: char,

    /// Optional equality filter, `key=value`
    pub filter: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            filter: None,
        }
    }
}
