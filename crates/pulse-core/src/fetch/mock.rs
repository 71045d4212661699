//! Mock executor and decoder for unit testing.
//!
//! [`MockQueryExecutor`] records every call and answers from canned
//! per-query replies. [`MockQueryExecutor::gate`] queues a reply that is
//! held until the test releases it, which is how tests make fetches
//! resolve in a chosen order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::errors::{DecodeError, FetchError};
use super::traits::{QueryExecutor, ResponseDecoder};
use crate::query::{Query, RawResponse, Table};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A recorded call to the mock executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub link: String,
    pub query: String,
}

type Reply = Result<RawResponse, FetchError>;

/// Mock implementation of `QueryExecutor` for testing.
#[derive(Default)]
pub struct MockQueryExecutor {
    replies: Mutex<HashMap<String, Reply>>,
    gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    calls: Mutex<Vec<MockCall>>,
}

/// Release handle for one gated reply.
pub struct MockGate {
    sender: oneshot::Sender<Reply>,
}

impl MockGate {
    /// Let the held call succeed with `body`.
    pub fn resolve(self, body: impl Into<String>) {
        let _ = self.sender.send(Ok(RawResponse::new(body)));
    }

    /// Let the held call fail with `error`.
    pub fn fail(self, error: FetchError) {
        let _ = self.sender.send(Err(error));
    }
}

impl MockQueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query_text` with `body` whenever no gate is queued.
    pub fn with_response(self, query_text: &str, body: impl Into<String>) -> Self {
        lock(&self.replies).insert(query_text.to_string(), Ok(RawResponse::new(body)));
        self
    }

    /// Answer `query_text` with `error` whenever no gate is queued.
    pub fn with_error(self, query_text: &str, error: FetchError) -> Self {
        lock(&self.replies).insert(query_text.to_string(), Err(error));
        self
    }

    /// Replace the canned reply for `query_text` after construction.
    pub fn set_response(&self, query_text: &str, body: impl Into<String>) {
        lock(&self.replies).insert(query_text.to_string(), Ok(RawResponse::new(body)));
    }

    /// Queue a held reply. The next call, whatever its query, waits on it.
    pub fn gate(&self) -> MockGate {
        let (sender, receiver) = oneshot::channel();
        lock(&self.gates).push_back(receiver);
        MockGate { sender }
    }

    /// Return all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Return the number of recorded calls.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl QueryExecutor for MockQueryExecutor {
    async fn execute(&self, link: &str, query: &Query) -> Result<RawResponse, FetchError> {
        lock(&self.calls).push(MockCall {
            link: link.to_string(),
            query: query.text.clone(),
        });

        let gate = lock(&self.gates).pop_front();
        if let Some(gate) = gate {
            return gate.await.unwrap_or_else(|_| {
                Err(FetchError::Transport {
                    message: "mock gate dropped".to_string(),
                })
            });
        }

        lock(&self.replies)
            .get(&query.text)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::Transport {
                    message: format!("no mock response for query {:?}", query.text),
                })
            })
    }
}

/// Mock implementation of `ResponseDecoder` keyed by response body.
///
/// Unknown bodies decode to `DecodeError::Malformed`.
#[derive(Default)]
pub struct MockDecoder {
    tables: Mutex<HashMap<String, Result<Vec<Table>, DecodeError>>>,
    decoded: Mutex<usize>,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(self, body: &str, tables: Vec<Table>) -> Self {
        lock(&self.tables).insert(body.to_string(), Ok(tables));
        self
    }

    pub fn with_error(self, body: &str, error: DecodeError) -> Self {
        lock(&self.tables).insert(body.to_string(), Err(error));
        self
    }

    /// Number of responses decoded so far.
    pub fn decode_count(&self) -> usize {
        *lock(&self.decoded)
    }
}

impl ResponseDecoder for MockDecoder {
    fn decode(&self, raw: &RawResponse) -> Result<Vec<Table>, DecodeError> {
        *lock(&self.decoded) += 1;
        lock(&self.tables)
            .get(&raw.body)
            .cloned()
            .unwrap_or_else(|| {
                Err(DecodeError::Malformed {
                    message: format!("unexpected body {:?}", raw.body),
                })
            })
    }
}

/// Helper to create a test table with `rows` data rows.
pub fn test_table(id: &str, rows: usize) -> Table {
    Table {
        id: id.to_string(),
        name: format!("{id}-name"),
        result: "_result".to_string(),
        group_key: [("_measurement".to_string(), "cpu".to_string())]
            .into_iter()
            .collect(),
        columns: vec!["_time".to_string(), "_value".to_string()],
        data: (0..rows)
            .map(|i| vec![format!("2019-01-01T00:00:{i:02}Z"), format!("{i}.0")])
            .collect(),
    }
}
