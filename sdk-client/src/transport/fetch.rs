//! Fetch-style transport on the async reqwest client.
//!
//! The status line is inspected as soon as headers arrive, so a download
//! knows whether to keep the body as bytes before reading it.

use super::{Transport, TransportConfig, TransportError};
use async_trait::async_trait;
use nimbus_sdk_types::{Headers, Method, Request, Response, ResponseBody};

/// Async HTTP transport backed by [`reqwest::Client`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct FetchTransport {
    client: reqwest::Client,
}

impl FetchTransport {
    /// Create a transport with no request timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with the given settings.
    pub fn with_config(config: TransportConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    async fn send(&self, request: Request) -> Result<reqwest::Response, TransportError> {
        let mut builder = self.client.request(to_reqwest_method(request.method), &request.url);
        for (name, value) in request.wire_headers().iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_bytes());
        }
        Ok(builder.send().await?)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_builder() {
            TransportError::InvalidRequest(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::ReceiveFailed(e.to_string())
        } else {
            TransportError::ConnectionFailed(e.to_string())
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

#[async_trait]
impl Transport for FetchTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let bytes = response.bytes().await?;
        Ok(Response::new(
            status,
            headers,
            ResponseBody::decode(status, &bytes),
        ))
    }

    async fn execute_for_download(&self, request: Request) -> Result<Response, TransportError> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let binary = response.status().is_success();
        let bytes = response.bytes().await?;
        let body = if binary {
            ResponseBody::Binary(bytes.to_vec())
        } else {
            ResponseBody::decode(status, &bytes)
        };
        Ok(Response::new(status, headers, body))
    }
}
