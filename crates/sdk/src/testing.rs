//! In-memory [`Transport`] for tests.
//!
//! Enabled with the `testing` feature. [`StubTransport`] records every request
//! it receives and answers from a queue of canned outcomes, so client tests can
//! assert both what was sent and how the reply was interpreted.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::transport::{ApiRequest, RawResponse, Transport, TransportError};

/// A transport that replays queued outcomes in order.
///
/// When the queue is empty it answers `204 No Content`.
#[derive(Debug, Default)]
pub struct StubTransport {
    outcomes: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn respond(&self, response: RawResponse) -> &Self {
        self.lock_outcomes().push_back(Ok(response));
        self
    }

    /// Queues a transport failure.
    pub fn fail(&self, error: TransportError) -> &Self {
        self.lock_outcomes().push_back(Err(error));
        self
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the single request received, panicking if there was not
    /// exactly one.
    pub fn only_request(&self) -> ApiRequest {
        let mut requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.remove(0)
    }

    fn lock_outcomes(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<RawResponse, TransportError>>> {
        match self.outcomes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
        self.lock_outcomes()
            .pop_front()
            .unwrap_or_else(|| Ok(RawResponse::new(204)))
    }
}
