//! # sdk-core
//!
//! Pure logic for the Nimbus SDK (no I/O, instant tests).
//!
//! This crate implements the rules for keeping a locally-mutated object in
//! step with the server, without any network I/O:
//! - [`entity`]: committed vs. pending field sets, snapshots, removal markers
//! - [`protocol`]: which verb, precondition and body a save uses
//! - [`classifier`]: structured and legacy error classification
//! - [`readiness`]: the bounded endpoint-readiness retry
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. The actual I/O is performed by `sdk-client`, which
//! executes the plans produced here and feeds responses back in.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classifier;
pub mod codes;
pub mod entity;
pub mod protocol;
pub mod readiness;

pub use classifier::{classify_legacy, classify_response, match_legacy, LegacyRule, LEGACY_RULES};
pub use codes::status_for_code;
pub use entity::{is_user_key, BodyScope, EntityState, WriteAck, RESERVED_PREFIX};
pub use protocol::{
    content_type, plan_body_transfer, plan_delete, plan_refresh, plan_save,
    type_hint_from_content_type, Lifecycle, ProtocolError, SaveMode, SavePlan, WriteKind,
    IF_MATCH, JSON_CONTENT_TYPE, METHOD_OVERRIDE,
};
pub use readiness::{ProbeAction, ReadinessProbe};
