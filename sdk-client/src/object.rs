//! Remote objects: local edits reconciled with server state.
//!
//! [`RemoteObject`] wraps a pure [`EntityState`] and runs the plans produced
//! by `nimbus_sdk_core::protocol` against a [`Transport`]. Every check that
//! can fail locally (missing version token, unsaved or deleted object)
//! fails before a request is built.
//!
//! All mutating operations take `&mut self`, so two saves of the same
//! object can never be in flight at once.

use nimbus_sdk_core::{
    classify_response, content_type, plan_body_transfer, plan_delete, plan_refresh, plan_save,
    type_hint_from_content_type, EntityState, SaveMode, WriteAck, WriteKind, IF_MATCH,
    METHOD_OVERRIDE,
};
use nimbus_sdk_types::{
    ClassifiedError, Method, ObjectId, RequestBody, Response, ResponseBody, VersionToken,
    STATUS_UNPARSEABLE,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::client::Bucket;
use crate::error::{classify_transport, ClientError, EntityRef};
use crate::transport::{Transport, TransportError};

/// Downloaded object body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectBody {
    /// Content type reported by the server.
    pub content_type: Option<String>,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// An object in a bucket, with pending local changes.
pub struct RemoteObject<T: Transport> {
    bucket: Bucket<T>,
    state: EntityState,
}

impl<T: Transport> RemoteObject<T> {
    pub(crate) fn unsaved(bucket: Bucket<T>, type_hint: Option<&str>) -> Self {
        let state = match type_hint {
            Some(hint) => EntityState::with_type_hint(hint),
            None => EntityState::new(),
        };
        Self { bucket, state }
    }

    pub(crate) fn existing(bucket: Bucket<T>, id: ObjectId) -> Self {
        Self {
            bucket,
            state: EntityState::existing(id),
        }
    }

    // ---------------------------------------------------------------
    // Local fields
    // ---------------------------------------------------------------

    /// Stage a field. Empty and `_`-prefixed keys are ignored, as is any
    /// change to a deleted object.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.state.set(key, value.into());
    }

    /// Current value of a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Remove a field. Ignored on a deleted object.
    pub fn remove(&mut self, key: &str) {
        self.state.remove(key);
    }

    /// Visible field names, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.state.keys()
    }

    /// Underlying entity state.
    pub fn state(&self) -> &EntityState {
        &self.state
    }

    /// Server-assigned identity.
    pub fn identity(&self) -> Option<&ObjectId> {
        self.state.identity()
    }

    /// Last observed version token.
    pub fn version(&self) -> Option<&VersionToken> {
        self.state.version()
    }

    /// Bucket holding this object.
    pub fn bucket(&self) -> &Bucket<T> {
        &self.bucket
    }

    /// Object URL, once it has an identity.
    pub fn uri(&self) -> Option<String> {
        self.state
            .identity()
            .map(|id| format!("{}/{}", self.bucket.objects_url(), id))
    }

    /// Reference used in error reports.
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            scope: self.bucket.scope().clone(),
            bucket: self.bucket.name().clone(),
            object_id: self.state.identity().cloned(),
        }
    }

    // ---------------------------------------------------------------
    // Remote operations
    // ---------------------------------------------------------------

    /// Create the object, or replace every field of an existing one.
    ///
    /// With `overwrite == false` the write is conditional on the last
    /// observed version token; without one this fails locally.
    pub async fn save(&mut self, overwrite: bool) -> Result<(), ClientError> {
        self.write(SaveMode::Full, overwrite).await
    }

    /// Send pending fields only. An unsaved object is created in full.
    ///
    /// Removed fields are not transmitted by a patch; they stay marked
    /// until the next [`RemoteObject::save`] or [`RemoteObject::refresh`].
    pub async fn patch_save(&mut self, overwrite: bool) -> Result<(), ClientError> {
        self.write(SaveMode::Patch, overwrite).await
    }

    async fn write(&mut self, mode: SaveMode, overwrite: bool) -> Result<(), ClientError> {
        let plan = plan_save(self.state.lifecycle(), self.state.version(), mode, overwrite)?;
        let url = match plan.kind {
            WriteKind::Create => self.bucket.objects_url(),
            WriteKind::Replace | WriteKind::Patch => self.object_url()?,
        };
        let body = Value::Object(self.state.build_body(plan.scope));
        let media_type = content_type(self.bucket.client().context().app_id(), self.state.type_hint());

        let mut handle = self.bucket.client().request(plan.method, &url);
        handle.set_content_type(&media_type);
        if let Some(method) = plan.method_override {
            handle.add_header(METHOD_OVERRIDE, method.as_str());
        }
        if let Some(token) = &plan.precondition {
            handle.add_header(IF_MATCH, token.as_str());
        }
        let response = handle
            .send(Some(RequestBody::Json(body)))
            .await
            .map_err(|e| self.transport_failure(&e))?;
        if !response.is_success() {
            return Err(self.remote_failure(&response));
        }

        let version = etag_version(&response);
        match plan.kind {
            WriteKind::Create => {
                let ack = WriteAck::from_json(&body_object(&response));
                let identity = self.created_identity(&ack)?;
                self.state.on_created(identity, &ack, version);
                info!(target_ref = %self.entity_ref(), "object created");
            }
            WriteKind::Replace => {
                let ack = WriteAck::from_json(&body_object(&response));
                self.state.on_replaced(&ack, version);
                debug!(target_ref = %self.entity_ref(), "object replaced");
            }
            WriteKind::Patch => {
                let snapshot = self.snapshot(&response)?;
                self.state.on_patched(&snapshot, version);
                debug!(target_ref = %self.entity_ref(), "object patched");
            }
        }
        Ok(())
    }

    /// Replace local state with the server's. Pending changes are dropped.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        plan_refresh(self.state.lifecycle())?;
        let url = self.object_url()?;
        let response = self
            .bucket
            .client()
            .request(Method::Get, &url)
            .send(None)
            .await
            .map_err(|e| self.transport_failure(&e))?;
        if !response.is_success() {
            return Err(self.remote_failure(&response));
        }

        let snapshot = self.snapshot(&response)?;
        let type_hint = response.content_type().and_then(|ct| {
            type_hint_from_content_type(self.bucket.client().context().app_id(), ct)
        });
        self.state
            .on_refreshed(&snapshot, etag_version(&response), type_hint);
        debug!(target_ref = %self.entity_ref(), "object refreshed");
        Ok(())
    }

    /// Delete the object. Terminal: every later remote call fails locally.
    pub async fn delete(&mut self) -> Result<(), ClientError> {
        plan_delete(self.state.lifecycle())?;
        let url = self.object_url()?;
        let response = self
            .bucket
            .client()
            .request(Method::Delete, &url)
            .send(None)
            .await
            .map_err(|e| self.transport_failure(&e))?;
        if !response.is_success() {
            return Err(self.remote_failure(&response));
        }
        self.state.on_deleted();
        info!(target_ref = %self.entity_ref(), "object deleted");
        Ok(())
    }

    /// Upload the object body.
    pub async fn upload_body(
        &mut self,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ClientError> {
        plan_body_transfer(self.state.lifecycle())?;
        let url = self.body_url()?;
        let mut handle = self.bucket.client().request(Method::Put, &url);
        handle.set_content_type(media_type);
        let response = handle
            .send(Some(RequestBody::Binary(bytes)))
            .await
            .map_err(|e| self.transport_failure(&e))?;
        if !response.is_success() {
            return Err(self.remote_failure(&response));
        }
        debug!(target_ref = %self.entity_ref(), "object body uploaded");
        Ok(())
    }

    /// Download the object body.
    pub async fn download_body(&self) -> Result<ObjectBody, ClientError> {
        plan_body_transfer(self.state.lifecycle())?;
        let url = self.body_url()?;
        let response = self
            .bucket
            .client()
            .request(Method::Get, &url)
            .send_for_download(None)
            .await
            .map_err(|e| self.transport_failure(&e))?;
        if !response.is_success() {
            return Err(self.remote_failure(&response));
        }
        let content_type = response.content_type().map(str::to_string);
        let bytes = match response.body {
            ResponseBody::Binary(bytes) => bytes,
            ResponseBody::Text(text) => text.into_bytes(),
            ResponseBody::Json(value) => value.to_string().into_bytes(),
        };
        Ok(ObjectBody {
            content_type,
            bytes,
        })
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    fn object_url(&self) -> Result<String, ClientError> {
        self.uri()
            .ok_or_else(|| ClientError::IllegalState("object has not been created yet".into()))
    }

    fn body_url(&self) -> Result<String, ClientError> {
        Ok(format!("{}/body", self.object_url()?))
    }

    /// Identity assigned by a create. Without a valid one the object cannot
    /// be addressed again, so the create is reported as failed.
    fn created_identity(&self, ack: &WriteAck) -> Result<ObjectId, ClientError> {
        match ack.object_id.as_deref() {
            Some(raw) => ObjectId::parse(raw)
                .map_err(|e| self.malformed_response(format!("create response carried an {e}"))),
            None => Err(self.malformed_response("create response carried no objectID".into())),
        }
    }

    /// Field snapshot from a refresh or patch response.
    fn snapshot(&self, response: &Response) -> Result<Map<String, Value>, ClientError> {
        response.body.as_object().cloned().ok_or_else(|| {
            self.malformed_response(format!(
                "expected a JSON object in the {} response",
                response.status
            ))
        })
    }

    fn malformed_response(&self, message: String) -> ClientError {
        warn!(target_ref = %self.entity_ref(), %message, "malformed success response");
        ClientError::remote(
            ClassifiedError::new(STATUS_UNPARSEABLE, None, message),
            Some(self.entity_ref()),
        )
    }

    fn transport_failure(&self, error: &TransportError) -> ClientError {
        warn!(target_ref = %self.entity_ref(), %error, "request failed without a response");
        ClientError::remote(classify_transport(error), Some(self.entity_ref()))
    }

    fn remote_failure(&self, response: &Response) -> ClientError {
        let error = classify_response(response.status, &response.body);
        if error.is_conflict() {
            warn!(
                target_ref = %self.entity_ref(),
                status = error.status,
                code = ?error.code,
                "version conflict"
            );
        } else {
            debug!(target_ref = %self.entity_ref(), %error, "request rejected");
        }
        ClientError::remote(error, Some(self.entity_ref()))
    }
}

fn etag_version(response: &Response) -> Option<VersionToken> {
    response.etag().and_then(VersionToken::new)
}

/// Acknowledgement fields; acks carry no field state, so any body shape is tolerated.
fn body_object(response: &Response) -> Map<String, Value> {
    response.body.as_object().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::context::AppContext;
    use crate::transport::MockTransport;
    use nimbus_sdk_types::Headers;
    use serde_json::json;

    const OBJECTS: &str = "https://api.test/apps/app1/buckets/scores/objects";

    fn setup() -> (MockTransport, Bucket<MockTransport>) {
        let transport = MockTransport::new();
        let context = AppContext::new("https://api.test", "app1", "key1").with_access_token("tok");
        let client = Client::new(context, transport.clone());
        let bucket = client.bucket("scores").unwrap();
        (transport, bucket)
    }

    async fn created(transport: &MockTransport, bucket: &Bucket<MockTransport>) -> RemoteObject<MockTransport> {
        let mut object = bucket.create_object();
        object.set("score", 10);
        transport.queue_json_with_etag(201, json!({"objectID": "abc", "createdAt": 1000}), "\"1\"");
        object.save(true).await.unwrap();
        transport.reset();
        object
    }

    // ===========================================
    // Save Tests
    // ===========================================

    #[tokio::test]
    async fn create_posts_full_body() {
        let (transport, bucket) = setup();
        let mut object = bucket.create_object();
        object.set("score", 10);
        transport.queue_json(201, json!({"objectID": "abc", "createdAt": 1000}));

        object.save(false).await.unwrap();

        let sent = transport.last_sent().unwrap();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.url, OBJECTS);
        assert_eq!(sent.content_type.as_deref(), Some("application/json"));
        assert_eq!(sent.headers.get(IF_MATCH), None);
        assert_eq!(sent.body, Some(RequestBody::Json(json!({"score": 10}))));
        assert_eq!(object.identity().map(ObjectId::as_str), Some("abc"));
        assert_eq!(object.state().created_at(), 1000);
        assert_eq!(object.state().modified_at(), 1000);
        assert!(object.state().pending().is_empty());
    }

    #[tokio::test]
    async fn typed_create_uses_vendor_content_type() {
        let (transport, bucket) = setup();
        let mut object = bucket.create_object_with_type("score");
        object.set("points", 1);
        transport.queue_json(201, json!({"objectID": "abc", "createdAt": 1}));
        object.save(true).await.unwrap();

        let sent = transport.last_sent().unwrap();
        assert_eq!(
            sent.content_type.as_deref(),
            Some("application/vnd.app1.score+json")
        );
    }

    #[tokio::test]
    async fn conditional_replace_sends_if_match() {
        let (transport, bucket) = setup();
        let mut object = created(&transport, &bucket).await;
        object.set("score", 11);
        transport.queue_json_with_etag(200, json!({"modifiedAt": 2000}), "\"2\"");

        object.save(false).await.unwrap();

        let sent = transport.last_sent().unwrap();
        assert_eq!(sent.method, Method::Put);
        assert_eq!(sent.url, format!("{OBJECTS}/abc"));
        assert_eq!(sent.headers.get(IF_MATCH), Some("\"1\""));
        assert_eq!(object.version().map(VersionToken::as_str), Some("\"2\""));
        assert_eq!(object.state().modified_at(), 2000);
    }

    #[tokio::test]
    async fn patch_tunnels_and_sends_pending_only() {
        let (transport, bucket) = setup();
        let mut object = created(&transport, &bucket).await;
        object.set("level", 2);
        transport.queue_json(200, json!({"_id": "abc", "score": 10, "level": 2, "_version": "2"}));

        object.patch_save(false).await.unwrap();

        let sent = transport.last_sent().unwrap();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.headers.get(METHOD_OVERRIDE), Some("PATCH"));
        assert_eq!(sent.body, Some(RequestBody::Json(json!({"level": 2}))));
        assert_eq!(object.version().map(VersionToken::as_str), Some("2"));
    }

    #[tokio::test]
    async fn failed_save_keeps_pending() {
        let (transport, bucket) = setup();
        let mut object = created(&transport, &bucket).await;
        object.set("score", 99);
        transport.queue_json(409, json!({"errorCode": "OBJECT_VERSION_IS_STALE", "message": "stale"}));

        let err = object.save(false).await.unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert!(err.is_conflict());
        assert_eq!(object.state().pending().get("score"), Some(&json!(99)));
        assert_eq!(object.version().map(VersionToken::as_str), Some("\"1\""));
        match err {
            ClientError::Remote { target, .. } => {
                assert_eq!(target.unwrap().object_id.map(|id| id.to_string()), Some("abc".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_status_zero() {
        let (transport, bucket) = setup();
        let mut object = bucket.create_object();
        object.set("score", 1);
        transport.fail_next("connection refused");

        let err = object.save(true).await.unwrap_err();
        assert_eq!(err.status(), Some(0));
        assert!(object.identity().is_none());
        assert_eq!(object.state().pending().len(), 1);
    }

    #[tokio::test]
    async fn create_without_object_id_is_not_a_success() {
        let (transport, bucket) = setup();
        let mut object = bucket.create_object();
        object.set("score", 10);
        transport.queue_json(201, json!({"createdAt": 1000}));

        let err = object.save(true).await.unwrap_err();

        assert_eq!(err.status(), Some(STATUS_UNPARSEABLE));
        assert!(object.identity().is_none());
        assert_eq!(object.state().created_at(), 0);
        assert_eq!(object.state().pending().get("score"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn create_with_malformed_object_id_is_not_a_success() {
        let (transport, bucket) = setup();
        let mut object = bucket.create_object();
        object.set("score", 10);
        transport.queue_json(201, json!({"objectID": "x", "createdAt": 1000}));

        let err = object.save(true).await.unwrap_err();

        let classified = err.classified().unwrap();
        assert_eq!(classified.status, STATUS_UNPARSEABLE);
        assert!(classified.message.contains("invalid object id"));
        assert!(object.identity().is_none());
        assert_eq!(object.state().pending().get("score"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn failed_patch_keeps_pending_markers_and_version() {
        let (transport, bucket) = setup();
        let mut object = created(&transport, &bucket).await;
        object.set("level", 2);
        object.remove("score");
        let before = object.state().clone();

        transport.queue_json(409, json!({"errorCode": "OBJECT_VERSION_IS_STALE", "message": "stale"}));
        let err = object.patch_save(false).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(object.state(), &before);

        transport.fail_next("connection reset");
        let err = object.patch_save(false).await.unwrap_err();
        assert_eq!(err.status(), Some(0));
        assert_eq!(object.state(), &before);

        assert_eq!(object.state().pending().get("level"), Some(&json!(2)));
        assert_eq!(object.state().removed_keys().collect::<Vec<_>>(), vec!["score"]);
        assert_eq!(object.version().map(VersionToken::as_str), Some("\"1\""));
    }

    #[tokio::test]
    async fn patch_with_non_object_body_keeps_state() {
        let (transport, bucket) = setup();
        let mut object = created(&transport, &bucket).await;
        object.set("level", 2);
        let before = object.state().clone();
        transport.queue_response(Response::new(
            200,
            Headers::new(),
            ResponseBody::Text("ok".into()),
        ));

        let err = object.patch_save(true).await.unwrap_err();

        assert_eq!(err.status(), Some(STATUS_UNPARSEABLE));
        assert_eq!(object.state(), &before);
        assert_eq!(object.get("score"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn conditional_save_without_token_sends_nothing() {
        let (transport, bucket) = setup();
        let mut object = bucket.object("abc").unwrap();
        object.set("score", 1);

        let err = object.save(false).await.unwrap_err();

        assert!(matches!(err, ClientError::IllegalState(_)));
        assert!(transport.sent_requests().is_empty());
    }

    // ===========================================
    // Refresh / Delete Tests
    // ===========================================

    #[tokio::test]
    async fn refresh_reads_type_hint_and_etag() {
        let (transport, bucket) = setup();
        let mut object = bucket.object("abc").unwrap();
        let headers: Headers = [
            ("ETag", "\"7\""),
            ("Content-Type", "application/vnd.app1.score+json"),
        ]
        .into_iter()
        .collect();
        transport.queue_response(Response::new(
            200,
            headers,
            ResponseBody::Json(json!({"_id": "abc", "score": 3, "_owner": "u1"})),
        ));

        object.refresh().await.unwrap();

        assert_eq!(transport.last_sent().unwrap().method, Method::Get);
        assert_eq!(object.get("score"), Some(&json!(3)));
        assert_eq!(object.version().map(VersionToken::as_str), Some("\"7\""));
        assert_eq!(object.state().type_hint(), Some("score"));
        assert_eq!(object.state().owner(), Some("u1"));
    }

    #[tokio::test]
    async fn refresh_with_non_object_body_keeps_committed_fields() {
        let (transport, bucket) = setup();
        let mut object = created(&transport, &bucket).await;
        transport.queue_json(200, json!(["not", "an", "object"]));

        let err = object.refresh().await.unwrap_err();

        assert_eq!(err.status(), Some(STATUS_UNPARSEABLE));
        assert_eq!(object.get("score"), Some(&json!(10)));
        assert_eq!(object.version().map(VersionToken::as_str), Some("\"1\""));
    }

    #[tokio::test]
    async fn refresh_unsaved_is_illegal() {
        let (transport, bucket) = setup();
        let mut object = bucket.create_object();
        assert!(matches!(
            object.refresh().await,
            Err(ClientError::IllegalState(_))
        ));
        assert!(transport.sent_requests().is_empty());
    }

    #[tokio::test]
    async fn delete_is_terminal() {
        let (transport, bucket) = setup();
        let mut object = created(&transport, &bucket).await;
        transport.queue_json(204, json!({}));

        object.delete().await.unwrap();
        assert_eq!(transport.last_sent().unwrap().method, Method::Delete);

        transport.reset();
        assert!(matches!(object.save(true).await, Err(ClientError::IllegalState(_))));
        assert!(matches!(object.refresh().await, Err(ClientError::IllegalState(_))));
        assert!(matches!(object.delete().await, Err(ClientError::IllegalState(_))));
        assert!(transport.sent_requests().is_empty());
    }

    // ===========================================
    // Object Body Tests
    // ===========================================

    #[tokio::test]
    async fn upload_and_download_body() {
        let (transport, bucket) = setup();
        let mut object = created(&transport, &bucket).await;

        transport.queue_json(200, json!({"modifiedAt": 3000}));
        object
            .upload_body("image/png", vec![0x89, 0x50])
            .await
            .unwrap();
        let sent = transport.last_sent().unwrap();
        assert_eq!(sent.method, Method::Put);
        assert_eq!(sent.url, format!("{OBJECTS}/abc/body"));
        assert_eq!(sent.content_type.as_deref(), Some("image/png"));
        assert_eq!(sent.body, Some(RequestBody::Binary(vec![0x89, 0x50])));

        let headers: Headers = [("Content-Type", "image/png")].into_iter().collect();
        transport.queue_response(Response::new(
            200,
            headers,
            ResponseBody::Binary(vec![0x89, 0x50]),
        ));
        let body = object.download_body().await.unwrap();
        assert_eq!(body.bytes, vec![0x89, 0x50]);
        assert_eq!(body.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn missing_body_is_classified() {
        let (transport, bucket) = setup();
        let object = created(&transport, &bucket).await;
        transport.queue_json(
            404,
            json!({"errorCode": "OBJECT_BODY_NOT_FOUND", "message": "no body"}),
        );

        let err = object.download_body().await.unwrap_err();
        let classified = err.classified().unwrap();
        assert_eq!(classified.status, 404);
        assert_eq!(classified.code.as_deref(), Some("OBJECT_BODY_NOT_FOUND"));
    }
}
