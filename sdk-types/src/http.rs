//! One-shot HTTP exchange values.
//!
//! A [`Request`] is built fresh for every call and consumed when sent.
//! A [`Response`] always carries a status; non-2xx responses are ordinary
//! values here and only become errors once classified.

use serde_json::{Map, Value};
use std::fmt;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
}

impl Method {
    /// Upper-case method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered header multimap with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of header entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no headers are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document.
    Json(Value),
    /// Raw bytes (object body uploads).
    Binary(Vec<u8>),
}

impl RequestBody {
    /// Serialize the payload for the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            // Serializing a `Value` cannot fail: all keys are strings.
            RequestBody::Json(value) => value.to_string().into_bytes(),
            RequestBody::Binary(bytes) => bytes.clone(),
        }
    }
}

/// A fully-built request, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL.
    pub url: String,
    /// Caller-supplied headers, in the order they were added.
    pub headers: Headers,
    /// Content type applied at send time.
    pub content_type: Option<String>,
    /// Bearer credential.
    pub access_token: Option<String>,
    /// Whether the bearer credential is attached.
    pub send_access_token: bool,
    /// Optional payload.
    pub body: Option<RequestBody>,
}

impl Request {
    /// Create a bare request with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            content_type: None,
            access_token: None,
            send_access_token: true,
            body: None,
        }
    }

    /// Headers as they go on the wire.
    ///
    /// Caller headers first, then `Content-Type` (only when a body or an
    /// explicit content type is present) and `Authorization` last. Every
    /// transport backend sends exactly this list.
    pub fn wire_headers(&self) -> Headers {
        let mut headers = self.headers.clone();
        if let Some(content_type) = &self.content_type {
            headers.append("Content-Type", content_type.clone());
        }
        if self.send_access_token {
            if let Some(token) = self.access_token.as_deref().filter(|t| !t.is_empty()) {
                headers.append("Authorization", format!("Bearer {token}"));
            }
        }
        headers
    }
}

/// Response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON document.
    Json(Value),
    /// Raw text when the body is not valid JSON.
    Text(String),
    /// Binary payload (successful downloads only).
    Binary(Vec<u8>),
}

impl ResponseBody {
    /// Decode a received body.
    ///
    /// 204 always yields an empty JSON object so that field access on the
    /// result stays uniform; otherwise JSON is attempted first and the raw
    /// text (lossy UTF-8) is the fallback.
    pub fn decode(status: u16, bytes: &[u8]) -> Self {
        if status == 204 {
            return ResponseBody::Json(Value::Object(Map::new()));
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Borrow the JSON document, if this is one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the JSON object, if this is one.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.as_json().and_then(Value::as_object)
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Headers,
    /// Decoded payload.
    pub body: ResponseBody,
}

impl Response {
    /// Build a response from its parts.
    pub fn new(status: u16, headers: Headers, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Shorthand for a JSON response without headers.
    pub fn json(status: u16, value: Value) -> Self {
        Self::new(status, Headers::new(), ResponseBody::Json(value))
    }

    /// True for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The `ETag` header, if present.
    pub fn etag(&self) -> Option<&str> {
        self.header("ETag")
    }

    /// The `Content-Type` header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }
}
