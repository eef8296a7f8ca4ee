//! Callback-style transport on a blocking ureq agent.
//!
//! Each request runs to completion on tokio's blocking pool. The worker
//! reports the outcome through a completion callback; [`Transport`] wraps
//! that callback in a oneshot channel so callers still just `.await`.
//!
//! Unlike [`super::FetchTransport`], the body is read in full before the
//! status is acted on, so the binary-or-decoded choice for downloads is made
//! on completion.

use super::{Transport, TransportConfig, TransportError};
use async_trait::async_trait;
use nimbus_sdk_types::{Headers, Request, Response, ResponseBody};
use std::io::Read;
use tokio::sync::oneshot;

/// Raw outcome of one exchange, before body decoding.
#[derive(Debug)]
pub struct Completion {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Headers,
    /// Body bytes exactly as received.
    pub bytes: Vec<u8>,
}

impl Completion {
    fn into_response(self, download: bool) -> Response {
        let body = if download && (200..300).contains(&self.status) {
            ResponseBody::Binary(self.bytes)
        } else {
            ResponseBody::decode(self.status, &self.bytes)
        };
        Response::new(self.status, self.headers, body)
    }
}

/// Blocking HTTP transport backed by [`ureq::Agent`].
///
/// Cloning is cheap; clones share the agent's connection pool.
#[derive(Clone, Debug)]
pub struct CallbackTransport {
    agent: ureq::Agent,
}

impl CallbackTransport {
    /// Create a transport with no request timeout.
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with the given settings.
    pub fn with_config(config: TransportConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }

    /// Start `request` on a blocking worker and return immediately.
    ///
    /// `on_complete` runs on the worker thread exactly once.
    pub fn dispatch<F>(&self, request: Request, on_complete: F)
    where
        F: FnOnce(Result<Completion, TransportError>) + Send + 'static,
    {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || on_complete(perform(&agent, &request)));
    }

    async fn execute_with(&self, request: Request, download: bool) -> Result<Response, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(request, move |outcome| {
            // The awaiting side may have been dropped; nothing to report to.
            let _ = tx.send(outcome);
        });
        let completion = rx
            .await
            .map_err(|_| TransportError::ReceiveFailed("worker exited without completing".into()))??;
        Ok(completion.into_response(download))
    }
}

impl Default for CallbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn perform(agent: &ureq::Agent, request: &Request) -> Result<Completion, TransportError> {
    let mut call = agent.request(request.method.as_str(), &request.url);
    for (name, value) in request.wire_headers().iter() {
        call = call.set(name, value);
    }
    let result = match &request.body {
        Some(body) => call.send_bytes(&body.to_bytes()),
        None => call.call(),
    };
    // Error statuses still carry a full response.
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(err)) => return Err(map_transport_error(err)),
    };

    let status = response.status();
    let mut headers = Headers::new();
    for name in response.headers_names() {
        for value in response.all(&name) {
            headers.append(name.clone(), value);
        }
    }
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;

    Ok(Completion {
        status,
        headers,
        bytes,
    })
}

fn map_transport_error(err: ureq::Transport) -> TransportError {
    match err.kind() {
        ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => {
            TransportError::InvalidRequest(err.to_string())
        }
        ureq::ErrorKind::Io if is_timeout(&err) => TransportError::Timeout,
        _ => TransportError::ConnectionFailed(err.to_string()),
    }
}

fn is_timeout(err: &ureq::Transport) -> bool {
    use std::error::Error as _;
    err.source()
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some_and(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        })
}

#[async_trait]
impl Transport for CallbackTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.execute_with(request, false).await
    }

    async fn execute_for_download(&self, request: Request) -> Result<Response, TransportError> {
        self.execute_with(request, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_sdk_types::Method;
    use serde_json::json;

    fn completion(status: u16, bytes: &[u8]) -> Completion {
        Completion {
            status,
            headers: Headers::new(),
            bytes: bytes.to_vec(),
        }
    }

    // ===========================================
    // Completion Decoding
    // ===========================================

    #[test]
    fn no_content_becomes_empty_object() {
        let response = completion(204, b"").into_response(false);
        assert_eq!(response.body, ResponseBody::Json(json!({})));
    }

    #[test]
    fn download_keeps_bytes_only_on_success() {
        let ok = completion(200, b"{\"looks\":\"json\"}").into_response(true);
        assert_eq!(ok.body, ResponseBody::Binary(b"{\"looks\":\"json\"}".to_vec()));

        let failed = completion(404, b"{\"errorCode\":\"X\"}").into_response(true);
        assert_eq!(failed.body, ResponseBody::Json(json!({"errorCode": "X"})));
    }

    #[test]
    fn plain_text_error_body_is_text() {
        let response = completion(502, b"bad gateway").into_response(false);
        assert_eq!(response.body, ResponseBody::Text("bad gateway".into()));
    }

    // ===========================================
    // Dispatch
    // ===========================================

    #[tokio::test]
    async fn dispatch_reports_through_callback() {
        let transport = CallbackTransport::new();
        let (tx, rx) = oneshot::channel();
        transport.dispatch(Request::new(Method::Get, "not a url"), move |outcome| {
            let _ = tx.send(outcome.is_err());
        });
        assert!(rx.await.unwrap());
    }

    #[tokio::test]
    async fn malformed_url_is_an_invalid_request() {
        let transport = CallbackTransport::new();
        let result = transport
            .execute(Request::new(Method::Get, "not a url"))
            .await;
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }
}
