//! Transport abstraction for the Nimbus SDK.
//!
//! This module provides a pluggable request/response layer. Every entity
//! operation goes through [`Transport`]; which backend sits behind it is the
//! caller's choice, passed in explicitly.
//!
//! # Design
//!
//! - [`Transport::create`] opens a one-shot [`RequestHandle`]
//! - the handle collects headers, content type and the bearer credential
//! - [`RequestHandle::send`] / [`RequestHandle::send_for_download`] consume it
//!
//! Non-2xx responses resolve normally; only a failure to get any response
//! at all (DNS, refused connection, timeout before a status line) yields a
//! [`TransportError`].
//!
//! # Backends
//!
//! - [`FetchTransport`]: async reqwest client, decides download handling
//!   when the status line arrives
//! - [`CallbackTransport`]: blocking ureq agent on a worker, completion
//!   delivered through a callback; decides download handling on completion
//! - [`MockTransport`]: queued responses for tests
//!
//! # Example
//!
//! ```ignore
//! let transport = FetchTransport::new()?;
//! let mut handle = transport.create(Method::Get, "https://api.example.com/api/apps/app1");
//! handle.set_access_token("token");
//! let response = handle.send(None).await?;
//! ```

mod callback;
mod fetch;
mod mock;

pub use callback::{CallbackTransport, Completion};
pub use fetch::FetchTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use nimbus_sdk_types::{Method, Request, RequestBody, Response};
use std::time::Duration;
use thiserror::Error;

/// Transport errors. Each one means no response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established or was reset.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// No status line before the deadline.
    #[error("request timed out")]
    Timeout,

    /// The request could not be built (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be read.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Transport trait for executing one request and returning its response.
///
/// Implementations handle the underlying HTTP client. Both methods resolve
/// with any status code the server sends.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request; the body is decoded as JSON with a text fallback,
    /// and a 204 yields an empty JSON object.
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;

    /// Send a request whose successful response is binary.
    ///
    /// On 2xx the body is [`nimbus_sdk_types::ResponseBody::Binary`];
    /// otherwise it is decoded like [`Transport::execute`] so the error can
    /// be classified.
    async fn execute_for_download(&self, request: Request) -> Result<Response, TransportError>;

    /// Open a request handle.
    fn create(&self, method: Method, url: &str) -> RequestHandle<'_, Self>
    where
        Self: Sized,
    {
        RequestHandle::new(self, method, url)
    }
}

/// Backend settings shared by the HTTP transports.
#[derive(Clone, Debug, Default)]
pub struct TransportConfig {
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// One-shot request builder bound to a transport.
pub struct RequestHandle<'a, T: Transport + ?Sized> {
    transport: &'a T,
    request: Request,
}

impl<'a, T: Transport + ?Sized> RequestHandle<'a, T> {
    /// Start a request.
    pub fn new(transport: &'a T, method: Method, url: &str) -> Self {
        Self {
            transport,
            request: Request::new(method, url),
        }
    }

    /// Append a header.
    pub fn add_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.request.headers.append(name, value);
        self
    }

    /// Set the content type applied at send time. Last call wins.
    pub fn set_content_type(&mut self, content_type: &str) -> &mut Self {
        self.request.content_type = Some(content_type.to_string());
        self
    }

    /// Set the bearer credential.
    pub fn set_access_token(&mut self, token: &str) -> &mut Self {
        self.request.access_token = Some(token.to_string());
        self
    }

    /// Attach (default) or suppress the bearer credential.
    pub fn send_access_token(&mut self, send: bool) -> &mut Self {
        self.request.send_access_token = send;
        self
    }

    /// The request as it stands.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Finish building without sending.
    pub fn into_request(self) -> Request {
        self.request
    }

    /// Send the request.
    pub async fn send(self, body: Option<RequestBody>) -> Result<Response, TransportError> {
        let mut request = self.request;
        request.body = body;
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(request).await?;
        tracing::debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Send the request, expecting a binary body on success.
    pub async fn send_for_download(
        self,
        body: Option<RequestBody>,
    ) -> Result<Response, TransportError> {
        let mut request = self.request;
        request.body = body;
        tracing::debug!(method = %request.method, url = %request.url, "sending download request");
        let response = self.transport.execute_for_download(request).await?;
        tracing::debug!(status = response.status, "received download response");
        Ok(response)
    }
}

/// Which HTTP backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// [`FetchTransport`].
    #[default]
    Fetch,
    /// [`CallbackTransport`].
    Callback,
}

/// Either HTTP backend, chosen at runtime from configuration.
#[derive(Clone)]
pub enum HttpTransport {
    /// reqwest-based backend.
    Fetch(FetchTransport),
    /// ureq-based backend.
    Callback(CallbackTransport),
}

impl HttpTransport {
    /// Build the backend named by `kind`.
    pub fn build(kind: TransportKind, config: TransportConfig) -> Result<Self, TransportError> {
        match kind {
            TransportKind::Fetch => Ok(Self::Fetch(FetchTransport::with_config(config)?)),
            TransportKind::Callback => Ok(Self::Callback(CallbackTransport::with_config(config))),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        match self {
            Self::Fetch(t) => t.execute(request).await,
            Self::Callback(t) => t.execute(request).await,
        }
    }

    async fn execute_for_download(&self, request: Request) -> Result<Response, TransportError> {
        match self {
            Self::Fetch(t) => t.execute_for_download(request).await,
            Self::Callback(t) => t.execute_for_download(request).await,
        }
    }
}
