//! Scripted in-memory transport for tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use contracts::{
    Batch, BatchPayload, BatchTransport, DeliveryError, DeliveryReceipt, FieldValue, Record,
    Schema,
};

/// Scripted response for one attempt
#[derive(Debug, Clone)]
pub enum Step {
    Accept(u16),
    Fail(DeliveryError),
    Panic,
}

impl Step {
    pub fn server(status: u16) -> Self {
        Self::Fail(DeliveryError::Server {
            status,
            body: String::new(),
        })
    }

    pub fn client(status: u16) -> Self {
        Self::Fail(DeliveryError::Client {
            status,
            body: String::new(),
        })
    }
}

/// Transport keyed by the `id` of the first record in each payload
///
/// Unscripted attempts are accepted with 200.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<i64, VecDeque<Step>>>,
    calls: Mutex<Vec<i64>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Script the attempts for the batch starting at record `first_id`
    pub fn script(self, first_id: i64, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(first_id, steps.into_iter().collect());
        self
    }

    /// Attempts seen for the batch starting at `first_id`
    pub fn calls_for(&self, first_id: i64) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| **id == first_id)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl BatchTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn deliver(&self, payload: &BatchPayload) -> Result<DeliveryReceipt, DeliveryError> {
        let value: serde_json::Value = serde_json::from_slice(&payload.body()).unwrap();
        let first_id = value["activityRecordList"][0]["id"].as_i64().unwrap();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(first_id);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let step = self
            .script
            .lock()
            .unwrap()
            .get_mut(&first_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Accept(200));

        match step {
            Step::Accept(status) => Ok(DeliveryReceipt { status }),
            Step::Fail(e) => Err(e),
            Step::Panic => panic!("scripted panic for batch starting at {first_id}"),
        }
    }
}

/// `n` single-column records with ids `0..n`
pub fn records(n: usize) -> Vec<Record> {
    let schema = Schema::new(["id"]);
    (0..n)
        .map(|i| Record::new(schema.clone(), vec![FieldValue::Integer(i as i64)]))
        .collect()
}

pub fn batch(index: usize, start: usize, len: usize) -> Batch {
    let records = records(start + len).split_off(start);
    Batch::new(index, start, records)
}
