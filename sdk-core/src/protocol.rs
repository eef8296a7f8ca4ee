//! Save/refresh protocol for remote objects.
//!
//! This module decides, without doing any I/O, which HTTP verb, headers and
//! body scope a write uses. `sdk-client` executes the returned plans.
//!
//! ```text
//!   Unsaved ──save──▶ Saved ──save / patch / refresh──▶ Saved
//!                       │
//!                       └──delete──▶ Deleted (terminal)
//! ```
//!
//! Conditional writes attach `If-Match` with the last observed version
//! token. Asking for one without a known token is a programmer error and is
//! rejected here, before anything reaches the network.

use nimbus_sdk_types::{Method, VersionToken};
use thiserror::Error;

use crate::entity::BodyScope;

/// Precondition header for conditional writes.
pub const IF_MATCH: &str = "If-Match";

/// Header used to tunnel PATCH through POST.
pub const METHOD_OVERRIDE: &str = "X-HTTP-Method-Override";

/// Generic JSON media type.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Entity lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No identity yet.
    Unsaved,
    /// Created on the server.
    Saved,
    /// Deleted on the server; no further transitions.
    Deleted,
}

/// Full-field or partial write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Send every field.
    Full,
    /// Send pending fields only.
    Patch,
}

/// What kind of write a plan performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// POST to the bucket.
    Create,
    /// PUT of every field.
    Replace,
    /// Partial update.
    Patch,
}

/// Protocol misuse, detected before any request is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A conditional write needs a version token; refresh first.
    #[error("conditional save requires a known version token; refresh first")]
    MissingVersion,

    /// The operation needs an object that exists on the server.
    #[error("object has not been created yet")]
    NotCreated,

    /// The object was deleted.
    #[error("object has been deleted")]
    Deleted,
}

/// How to perform one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePlan {
    /// Kind of write.
    pub kind: WriteKind,
    /// HTTP method on the wire.
    pub method: Method,
    /// Value for [`METHOD_OVERRIDE`], if any.
    pub method_override: Option<Method>,
    /// Value for [`IF_MATCH`], if any.
    pub precondition: Option<VersionToken>,
    /// Fields to send.
    pub scope: BodyScope,
}

/// Plan a save.
///
/// An unsaved entity is always created with every field and no
/// precondition, whatever `mode` and `overwrite` say.
pub fn plan_save(
    lifecycle: Lifecycle,
    version: Option<&VersionToken>,
    mode: SaveMode,
    overwrite: bool,
) -> Result<SavePlan, ProtocolError> {
    match lifecycle {
        Lifecycle::Deleted => Err(ProtocolError::Deleted),
        Lifecycle::Unsaved => Ok(SavePlan {
            kind: WriteKind::Create,
            method: Method::Post,
            method_override: None,
            precondition: None,
            scope: BodyScope::Full,
        }),
        Lifecycle::Saved => {
            let precondition = if overwrite {
                None
            } else {
                Some(version.cloned().ok_or(ProtocolError::MissingVersion)?)
            };
            let plan = match mode {
                SaveMode::Full => SavePlan {
                    kind: WriteKind::Replace,
                    method: Method::Put,
                    method_override: None,
                    precondition,
                    scope: BodyScope::Full,
                },
                SaveMode::Patch => SavePlan {
                    kind: WriteKind::Patch,
                    method: Method::Post,
                    method_override: Some(Method::Patch),
                    precondition,
                    scope: BodyScope::Pending,
                },
            };
            Ok(plan)
        }
    }
}

/// Check that a refresh is allowed.
pub fn plan_refresh(lifecycle: Lifecycle) -> Result<(), ProtocolError> {
    require_saved(lifecycle)
}

/// Check that a delete is allowed.
pub fn plan_delete(lifecycle: Lifecycle) -> Result<(), ProtocolError> {
    require_saved(lifecycle)
}

/// Check that a body transfer is allowed.
pub fn plan_body_transfer(lifecycle: Lifecycle) -> Result<(), ProtocolError> {
    require_saved(lifecycle)
}

fn require_saved(lifecycle: Lifecycle) -> Result<(), ProtocolError> {
    match lifecycle {
        Lifecycle::Saved => Ok(()),
        Lifecycle::Unsaved => Err(ProtocolError::NotCreated),
        Lifecycle::Deleted => Err(ProtocolError::Deleted),
    }
}

/// Content type for create and update bodies.
///
/// Every save path, retries included, goes through this function.
pub fn content_type(app_id: &str, type_hint: Option<&str>) -> String {
    match type_hint.filter(|hint| !hint.is_empty()) {
        Some(hint) => format!("application/vnd.{app_id}.{hint}+json"),
        None => JSON_CONTENT_TYPE.to_string(),
    }
}

/// Recover the type hint from a response content type.
///
/// Inverse of [`content_type`]; parameters such as `; charset=utf-8` are
/// ignored. Returns `None` for generic or foreign media types.
pub fn type_hint_from_content_type(app_id: &str, content_type: &str) -> Option<String> {
    let media = content_type.split(';').next()?.trim();
    let prefix = format!("application/vnd.{app_id}.");
    let hint = media.strip_prefix(&prefix)?.strip_suffix("+json")?;
    (!hint.is_empty()).then(|| hint.to_string())
}
