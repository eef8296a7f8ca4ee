//! # sdk-types
//!
//! Value types shared by every Nimbus SDK crate.
//!
//! This crate provides the foundational types used across the SDK:
//! - [`ObjectId`], [`BucketName`], [`VersionToken`] - Identity and revision types
//! - [`Request`], [`Response`], [`ResponseBody`] - One-shot HTTP exchange values
//! - [`ClassifiedError`] - Structured error with status, code and message

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod http;
mod ids;

pub use error::{
    ClassifiedError, IdError, RATE_LIMIT_CODE, RATE_LIMIT_MESSAGE, STATUS_NETWORK,
    STATUS_UNKNOWN_CODE, STATUS_UNPARSEABLE,
};
pub use http::{Headers, Method, Request, RequestBody, Response, ResponseBody};
pub use ids::{BucketName, ObjectId, VersionToken};
