//! BatchTransport trait - Sender output interface
//!
//! Defines the abstract interface for delivering one serialized batch.

use bytes::Bytes;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::{Batch, ContractError, DeliveryError, DeliveryReceipt, Record};

/// Serialized request body for one batch
///
/// Built once per batch and shared by every attempt.
#[derive(Debug, Clone)]
pub struct BatchPayload {
    body: Bytes,
    record_count: usize,
}

impl BatchPayload {
    /// Serialize `{"<field>": [record, ...]}`
    pub fn encode(field: &str, batch: &Batch) -> Result<Self, ContractError> {
        let envelope = Envelope {
            field,
            records: &batch.records,
        };
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| ContractError::Other(format!("payload encode error: {e}")))?;
        Ok(Self {
            body: Bytes::from(body),
            record_count: batch.len(),
        })
    }

    /// Request body (cheap to clone)
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }

    pub fn len_bytes(&self) -> usize {
        self.body.len()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

struct Envelope<'a> {
    field: &'a str,
    records: &'a [Record],
}

impl Serialize for Envelope<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field, self.records)?;
        map.end()
    }
}

/// Batch delivery trait
///
/// One call is one attempt; retries are the caller's concern.
#[trait_variant::make(BatchTransport: Send)]
pub trait LocalBatchTransport {
    /// Transport name (used for logging)
    fn name(&self) -> &str;

    /// Deliver one payload
    ///
    /// # Errors
    /// Returns a classified `DeliveryError`; see `DeliveryError::is_retryable`.
    async fn deliver(&self, payload: &BatchPayload) -> Result<DeliveryReceipt, DeliveryError>;
}
