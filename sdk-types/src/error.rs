//! Error types for the Nimbus SDK.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status used when no response was received at all.
pub const STATUS_NETWORK: i32 = 0;

/// Status used when a legacy error string matched no known shape.
pub const STATUS_UNPARSEABLE: i32 = -1;

/// Status used when a server error code is not in the code table.
pub const STATUS_UNKNOWN_CODE: i32 = -2;

/// Error code reported for rate-limited requests.
pub const RATE_LIMIT_CODE: &str = "TOO_MANY_REQUESTS";

/// Message reported for rate-limited requests.
pub const RATE_LIMIT_MESSAGE: &str = "Number of requests exceeds the limit.";

/// A server or transport failure reduced to status, code and message.
///
/// `status` is an HTTP status code or one of the sentinels
/// [`STATUS_NETWORK`], [`STATUS_UNPARSEABLE`] and [`STATUS_UNKNOWN_CODE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{status}: {message}")]
pub struct ClassifiedError {
    /// HTTP status or sentinel value.
    pub status: i32,
    /// Machine-readable server error code, if one was reported.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl ClassifiedError {
    /// Create a classified error.
    pub fn new(status: i32, code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    /// A failure where no response arrived.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(STATUS_NETWORK, None, message)
    }

    /// The canonical rate-limit error.
    pub fn rate_limited() -> Self {
        Self::new(429, Some(RATE_LIMIT_CODE), RATE_LIMIT_MESSAGE)
    }

    /// True when no response was received.
    pub fn is_network(&self) -> bool {
        self.status == STATUS_NETWORK
    }

    /// True for an optimistic-concurrency conflict (HTTP 409 or 412).
    pub fn is_conflict(&self) -> bool {
        matches!(self.status, 409 | 412)
    }
}

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Object id has the wrong length or characters.
    #[error("invalid object id: {0:?}")]
    InvalidObjectId(String),

    /// Bucket name has the wrong length or characters.
    #[error("invalid bucket name: {0:?}")]
    InvalidBucketName(String),
}
