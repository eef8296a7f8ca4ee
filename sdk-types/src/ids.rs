//! Identity and revision types for the Nimbus SDK.

use crate::error::IdError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A server-assigned object identifier.
///
/// 2 to 100 characters from `[A-Za-z0-9._-]`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(String);

impl ObjectId {
    /// Validate and wrap an object identifier.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
        if (2..=100).contains(&value.len()) && value.chars().all(valid_char) {
            Ok(Self(value.to_string()))
        } else {
            Err(IdError::InvalidObjectId(value.to_string()))
        }
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

/// The name of a bucket holding objects.
///
/// 2 to 64 characters from `[A-Za-z0-9_-]`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketName(String);

impl BucketName {
    /// Validate and wrap a bucket name.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-');
        if (2..=64).contains(&value.len()) && value.chars().all(valid_char) {
            Ok(Self(value.to_string()))
        } else {
            Err(IdError::InvalidBucketName(value.to_string()))
        }
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketName({})", self.0)
    }
}

/// An opaque server revision marker (ETag).
///
/// Kept verbatim, quotes included, so it can be echoed back in `If-Match`.
/// Only ever built from a server response.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a token. Empty or blank input means "unknown revision".
    pub fn new(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionToken({})", self.0)
    }
}
