//! HttpTransport - POST batches to the ingestion endpoint

use std::error::Error as StdError;

use contracts::{
    BatchPayload, BatchTransport, DeliveryError, DeliveryReceipt, EndpointConfig,
    HttpClientConfig,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::error::DispatcherError;

/// Response bodies are truncated to this many characters in error messages
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// HTTP transport backed by a pooled `reqwest::Client`
///
/// The client is shared by every concurrent attempt and released when the
/// transport is dropped.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl HttpTransport {
    /// Build the client from endpoint and HTTP settings
    ///
    /// # Errors
    /// `InvalidConfig` for an unparsable URL or header value,
    /// `ClientBuild` if the TLS backend cannot be initialized.
    #[instrument(name = "http_transport_new", skip_all, fields(url = %endpoint.url))]
    pub fn new(endpoint: &EndpointConfig, http: &HttpClientConfig) -> Result<Self, DispatcherError> {
        let url = Url::parse(&endpoint.url)
            .map_err(|e| DispatcherError::invalid_config("endpoint.url", e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let authorization = endpoint.authorization();
        if !authorization.is_empty() {
            let mut value = HeaderValue::from_str(&authorization).map_err(|e| {
                DispatcherError::invalid_config("endpoint.auth_token", e.to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        // reqwest has no pool-acquire or write timeout; both fold into the overall bound
        let overall = http.pool_timeout()
            + http.connect_timeout()
            + http.write_timeout()
            + http.read_timeout();

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(http.connect_timeout())
            .read_timeout(http.read_timeout())
            .timeout(overall)
            .pool_max_idle_per_host(http.max_connections)
            .build()
            .map_err(|e| DispatcherError::ClientBuild {
                message: error_chain(&e),
            })?;

        debug!(
            connect_timeout_ms = http.connect_timeout_ms,
            read_timeout_ms = http.read_timeout_ms,
            max_connections = http.max_connections,
            "HTTP client ready"
        );

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl BatchTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn deliver(&self, payload: &BatchPayload) -> Result<DeliveryReceipt, DeliveryError> {
        let response = self
            .client
            .post(self.url.clone())
            .body(payload.body())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeliveryReceipt {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status.as_u16(), &body))
    }
}

/// Classify a non-2xx response: 5xx is retryable, anything else is fatal
pub fn classify_status(status: u16, body: &str) -> DeliveryError {
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    if (500..600).contains(&status) {
        DeliveryError::Server { status, body }
    } else {
        DeliveryError::Client { status, body }
    }
}

fn classify_error(err: reqwest::Error) -> DeliveryError {
    let message = error_chain(&err);
    if err.is_timeout() {
        DeliveryError::Timeout { message }
    } else if err.is_connect() {
        DeliveryError::Connect { message }
    } else if err.is_builder() || is_malformed_response(&err) {
        DeliveryError::InvalidRequest { message }
    } else if err.is_request() || err.is_body() || err.is_decode() {
        DeliveryError::Transport { message }
    } else {
        DeliveryError::Unexpected { message }
    }
}

/// The peer answered with bytes that do not parse as an HTTP response
fn is_malformed_response(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            return hyper_err.is_parse();
        }
        source = cause.source();
    }
    false
}

/// Error message with its source chain, `outer: inner: root`
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
