//! Mock transport for testing.
//!
//! Allows queueing responses and capturing sent requests for verification.

use super::{Transport, TransportError};
use async_trait::async_trait;
use nimbus_sdk_types::{Headers, Request, Response, ResponseBody};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock transport for testing.
///
/// Responses are returned in the order they were queued. An empty queue
/// behaves like an unreachable server.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    sent_requests: Vec<Request>,
    response_queue: VecDeque<Response>,
    fail_next: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request.
    pub fn queue_response(&self, response: Response) {
        let mut inner = self.inner.lock().unwrap();
        inner.response_queue.push_back(response);
    }

    /// Queue a JSON response without headers.
    pub fn queue_json(&self, status: u16, body: Value) {
        self.queue_response(Response::json(status, body));
    }

    /// Queue a JSON response carrying an `ETag` header.
    pub fn queue_json_with_etag(&self, status: u16, body: Value, etag: &str) {
        let headers: Headers = [("ETag", etag)].into_iter().collect();
        self.queue_response(Response::new(status, headers, ResponseBody::Json(body)));
    }

    /// Get all requests that were sent.
    pub fn sent_requests(&self) -> Vec<Request> {
        let inner = self.inner.lock().unwrap();
        inner.sent_requests.clone()
    }

    /// Get the last request that was sent.
    pub fn last_sent(&self) -> Option<Request> {
        let inner = self.inner.lock().unwrap();
        inner.sent_requests.last().cloned()
    }

    /// Number of queued responses not yet consumed.
    pub fn pending_responses(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.response_queue.len()
    }

    /// Cause the next request to fail at the transport level.
    pub fn fail_next(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(error.to_string());
    }

    /// Clear all state (requests, queue, forced failure).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }

    fn next_response(&self, request: Request) -> Result<Response, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sent_requests.push(request);

        // Check for forced failure
        if let Some(error) = inner.fail_next.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner
            .response_queue
            .pop_front()
            .ok_or_else(|| TransportError::ConnectionFailed("no response queued".into()))
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.next_response(request)
    }

    async fn execute_for_download(&self, request: Request) -> Result<Response, TransportError> {
        let mut response = self.next_response(request)?;
        // Successful downloads are binary, whatever was queued.
        if response.is_success() {
            let bytes = match std::mem::replace(&mut response.body, ResponseBody::Binary(Vec::new())) {
                ResponseBody::Binary(bytes) => bytes,
                ResponseBody::Text(text) => text.into_bytes(),
                ResponseBody::Json(value) => value.to_string().into_bytes(),
            };
            response.body = ResponseBody::Binary(bytes);
        }
        Ok(response)
    }
}
