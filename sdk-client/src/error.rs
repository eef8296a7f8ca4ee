//! Client error type.

use nimbus_sdk_core::ProtocolError;
use nimbus_sdk_types::{BucketName, ClassifiedError, IdError, ObjectId};
use std::fmt;
use thiserror::Error;

use crate::transport::TransportError;

/// Where an object lives on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketScope {
    /// Application-wide bucket.
    App,
    /// Bucket owned by a user.
    User(String),
    /// Bucket owned by a group.
    Group(String),
    /// Bucket owned by a thing.
    Thing(String),
}

impl BucketScope {
    /// Path segment between `apps/<appId>` and `buckets/`, without slashes.
    pub(crate) fn segment(&self) -> Option<String> {
        match self {
            BucketScope::App => None,
            BucketScope::User(id) => Some(format!("users/{id}")),
            BucketScope::Group(id) => Some(format!("groups/{id}")),
            BucketScope::Thing(id) => Some(format!("things/{id}")),
        }
    }
}

/// The entity an error originated from, so the caller can retry against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// Bucket scope.
    pub scope: BucketScope,
    /// Bucket name.
    pub bucket: BucketName,
    /// Object identity; `None` for a create that never got one.
    pub object_id: Option<ObjectId>,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(segment) = self.scope.segment() {
            write!(f, "{segment}/")?;
        }
        write!(f, "buckets/{}/objects", self.bucket)?;
        if let Some(id) = &self.object_id {
            write!(f, "/{id}")?;
        }
        Ok(())
    }
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The operation is not valid in the entity's current state.
    /// Raised before any request is sent.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A caller-supplied argument was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server answered non-2xx, or no answer arrived (status 0).
    #[error("{error}")]
    Remote {
        /// Classified failure.
        error: ClassifiedError,
        /// Originating entity, when the call was entity-bound.
        target: Option<EntityRef>,
    },
}

impl ClientError {
    /// Status of a remote failure, `None` for local errors.
    pub fn status(&self) -> Option<i32> {
        self.classified().map(|e| e.status)
    }

    /// The classified failure, `None` for local errors.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            ClientError::Remote { error, .. } => Some(error),
            _ => None,
        }
    }

    /// True for an optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        self.classified().is_some_and(ClassifiedError::is_conflict)
    }

    pub(crate) fn remote(error: ClassifiedError, target: Option<EntityRef>) -> Self {
        ClientError::Remote { error, target }
    }
}

impl From<IdError> for ClientError {
    fn from(e: IdError) -> Self {
        ClientError::InvalidArgument(e.to_string())
    }
}

impl From<ProtocolError> for ClientError {
    fn from(e: ProtocolError) -> Self {
        ClientError::IllegalState(e.to_string())
    }
}

/// Classify a failure where no response arrived.
pub fn classify_transport(error: &TransportError) -> ClassifiedError {
    ClassifiedError::network(error.to_string())
}
