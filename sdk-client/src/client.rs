//! Client - the entry point of the Nimbus SDK.
//!
//! This module provides [`Client`], which pairs an [`AppContext`] with a
//! [`Transport`], and [`Bucket`], which hands out [`RemoteObject`]s.
//!
//! # Architecture
//!
//! Entity logic lives in sdk-core as pure state; the client turns its plans
//! into requests and feeds the responses back.
//!
//! ```text
//! Application → RemoteObject → Client → Transport → Network
//!                    ↓
//!              sdk-core (entity state + save protocol)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nimbus_sdk_client::{AppContext, Client, FetchTransport};
//!
//! let context = AppContext::new("https://api.example.com/api", "app1", "key")
//!     .with_access_token("token");
//! let client = Client::new(context, FetchTransport::new()?);
//!
//! let mut score = client.bucket("scores")?.create_object();
//! score.set("points", 10);
//! score.save(true).await?;
//! ```

use nimbus_sdk_types::{BucketName, Method, ObjectId};
use std::sync::Arc;

use crate::context::AppContext;
use crate::error::{BucketScope, ClientError};
use crate::object::RemoteObject;
use crate::transport::{RequestHandle, Transport};

/// Application identifier header.
pub const APP_ID_HEADER: &str = "X-App-ID";

/// Application key header.
pub const APP_KEY_HEADER: &str = "X-App-Key";

/// Context plus transport.
///
/// Cloning is cheap: both halves are behind `Arc`.
pub struct Client<T: Transport> {
    context: Arc<AppContext>,
    transport: Arc<T>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> Client<T> {
    /// Create a client.
    pub fn new(context: AppContext, transport: T) -> Self {
        Self {
            context: Arc::new(context),
            transport: Arc::new(transport),
        }
    }

    /// A client sharing this transport but using `context`.
    pub fn with_context(&self, context: AppContext) -> Self {
        Self {
            context: Arc::new(context),
            transport: Arc::clone(&self.transport),
        }
    }

    /// Replace the context, e.g. after a login.
    pub fn set_context(&mut self, context: AppContext) {
        self.context = Arc::new(context);
    }

    /// Current context.
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Open a request carrying the application headers and, when logged
    /// in, the bearer credential.
    pub fn request(&self, method: Method, url: &str) -> RequestHandle<'_, T> {
        let mut handle = self.transport.create(method, url);
        handle
            .add_header(APP_ID_HEADER, self.context.app_id())
            .add_header(APP_KEY_HEADER, self.context.app_key());
        if let Some(token) = self.context.access_token() {
            handle.set_access_token(token);
        }
        handle
    }

    /// An application-scope bucket.
    pub fn bucket(&self, name: &str) -> Result<Bucket<T>, ClientError> {
        self.scoped_bucket(BucketScope::App, name)
    }

    /// A bucket owned by user `user_id`.
    pub fn user_bucket(&self, user_id: &str, name: &str) -> Result<Bucket<T>, ClientError> {
        let owner = ObjectId::parse(user_id)?;
        self.scoped_bucket(BucketScope::User(owner.to_string()), name)
    }

    /// A bucket owned by group `group_id`.
    pub fn group_bucket(&self, group_id: &str, name: &str) -> Result<Bucket<T>, ClientError> {
        let owner = ObjectId::parse(group_id)?;
        self.scoped_bucket(BucketScope::Group(owner.to_string()), name)
    }

    /// A bucket owned by thing `thing_id`.
    pub fn thing_bucket(&self, thing_id: &str, name: &str) -> Result<Bucket<T>, ClientError> {
        let owner = ObjectId::parse(thing_id)?;
        self.scoped_bucket(BucketScope::Thing(owner.to_string()), name)
    }

    fn scoped_bucket(&self, scope: BucketScope, name: &str) -> Result<Bucket<T>, ClientError> {
        Ok(Bucket {
            client: self.clone(),
            scope,
            name: BucketName::parse(name)?,
        })
    }
}

/// A named object bucket.
pub struct Bucket<T: Transport> {
    client: Client<T>,
    scope: BucketScope,
    name: BucketName,
}

impl<T: Transport> Clone for Bucket<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            scope: self.scope.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T: Transport> Bucket<T> {
    /// Bucket name.
    pub fn name(&self) -> &BucketName {
        &self.name
    }

    /// Bucket scope.
    pub fn scope(&self) -> &BucketScope {
        &self.scope
    }

    /// The client this bucket sends through.
    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    /// `<app>[/<scope>]/buckets/<name>`.
    pub fn url(&self) -> String {
        let mut url = self.client.context().app_url();
        if let Some(segment) = self.scope.segment() {
            url.push('/');
            url.push_str(&segment);
        }
        url.push_str("/buckets/");
        url.push_str(self.name.as_str());
        url
    }

    /// `<bucket>/objects`.
    pub fn objects_url(&self) -> String {
        format!("{}/objects", self.url())
    }

    /// A new, unsaved object.
    pub fn create_object(&self) -> RemoteObject<T> {
        RemoteObject::unsaved(self.clone(), None)
    }

    /// A new, unsaved object whose content type carries `type_hint`.
    pub fn create_object_with_type(&self, type_hint: &str) -> RemoteObject<T> {
        RemoteObject::unsaved(self.clone(), Some(type_hint))
    }

    /// A reference to an existing object. Fields are empty until refreshed.
    pub fn object(&self, id: &str) -> Result<RemoteObject<T>, ClientError> {
        Ok(RemoteObject::existing(self.clone(), ObjectId::parse(id)?))
    }
}
