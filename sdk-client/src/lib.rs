//! # sdk-client
//!
//! Client library for the Nimbus backend-as-a-service REST API.
//!
//! This is the crate applications use to read and write remote objects.
//!
//! ## Features
//!
//! - **Optimistic Concurrency**: conditional writes with `If-Match` version tokens
//! - **Patch Tracking**: only pending fields travel on a partial save
//! - **Transport Abstraction**: pluggable backends (reqwest, ureq, mock)
//! - **Pure State Machine**: uses sdk-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use nimbus_sdk_client::{AppContext, Client, FetchTransport};
//!
//! let context = AppContext::new("https://api.example.com/api", "app1", "key");
//! let client = Client::new(context, FetchTransport::new()?);
//!
//! let mut object = client.bucket("scores")?.object("abc")?;
//! object.refresh().await?;
//! object.set("points", 42);
//! object.save(false).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod context;
pub mod error;
pub mod object;
pub mod readiness;
pub mod sequence;
pub mod transport;

pub use client::{Bucket, Client, APP_ID_HEADER, APP_KEY_HEADER};
pub use context::AppContext;
pub use error::{classify_transport, BucketScope, ClientError, EntityRef};
pub use object::{ObjectBody, RemoteObject};
pub use readiness::{wait_until_ready, wait_until_ready_with};
pub use sequence::{run_in_order, StepFailure};
pub use transport::{
    CallbackTransport, Completion, FetchTransport, HttpTransport, MockTransport, RequestHandle, Transport,
    TransportConfig, TransportError, TransportKind,
};
