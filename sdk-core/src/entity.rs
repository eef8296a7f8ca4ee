//! Entity state and patch tracking.
//!
//! An [`EntityState`] holds two field maps:
//! - **committed**: the last state confirmed by the server
//! - **pending**: local mutations not yet confirmed
//!
//! plus the reserved metadata the server assigns (identity, timestamps,
//! owner, version token, type hint). Nothing here performs I/O; the client
//! crate feeds server responses in through the `on_*` methods.
//!
//! Removal is tracked with markers. A full save propagates a removal by
//! omitting the key from the body; a patch save cannot express it, so the
//! marker survives until the next full save or refresh.

use nimbus_sdk_types::{ObjectId, VersionToken};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::protocol::Lifecycle;

/// Keys starting with this prefix are reserved for server metadata.
pub const RESERVED_PREFIX: char = '_';

/// Snapshot key carrying the object identity.
pub const KEY_ID: &str = "_id";
/// Snapshot key carrying the creation timestamp.
pub const KEY_CREATED: &str = "_created";
/// Snapshot key carrying the modification timestamp.
pub const KEY_MODIFIED: &str = "_modified";
/// Snapshot key carrying the owner.
pub const KEY_OWNER: &str = "_owner";
/// Snapshot key carrying the server revision.
pub const KEY_VERSION: &str = "_version";
/// Snapshot key carrying the application type hint.
pub const KEY_DATA_TYPE: &str = "_dataType";

/// True if `key` may be stored as a user field.
pub fn is_user_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with(RESERVED_PREFIX)
}

/// Which fields go into a write body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyScope {
    /// Pending merged over committed.
    Full,
    /// Pending only.
    Pending,
}

/// Acknowledgement returned by create and full-update calls.
///
/// These responses are not snapshots: they carry only identity and
/// timestamps under their own key names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteAck {
    /// Server-assigned identifier (`objectID`).
    pub object_id: Option<String>,
    /// Creation time in ms (`createdAt`).
    pub created_at: Option<i64>,
    /// Modification time in ms (`modifiedAt`).
    pub modified_at: Option<i64>,
    /// Type hint echoed by the server (`dataType`).
    pub data_type: Option<String>,
}

impl WriteAck {
    /// Read an acknowledgement from a response object.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self {
            object_id: map.get("objectID").and_then(Value::as_str).map(str::to_string),
            created_at: map.get("createdAt").and_then(Value::as_i64),
            modified_at: map.get("modifiedAt").and_then(Value::as_i64),
            data_type: map.get("dataType").and_then(Value::as_str).map(str::to_string),
        }
    }
}

/// In-memory state of one remote object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityState {
    identity: Option<ObjectId>,
    committed: Map<String, Value>,
    pending: Map<String, Value>,
    removed: BTreeSet<String>,
    version: Option<VersionToken>,
    created_at: i64,
    modified_at: i64,
    owner: Option<String>,
    type_hint: Option<String>,
    deleted: bool,
}

impl EntityState {
    /// A new, not yet created entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new entity whose creation will carry `type_hint`.
    pub fn with_type_hint(type_hint: &str) -> Self {
        Self {
            type_hint: Some(type_hint.to_string()).filter(|t| !t.is_empty()),
            ..Self::default()
        }
    }

    /// A reference to an existing server object; fields are unknown until refresh.
    pub fn existing(identity: ObjectId) -> Self {
        Self {
            identity: Some(identity),
            ..Self::default()
        }
    }

    // ---------------------------------------------------------------
    // Field access
    // ---------------------------------------------------------------

    /// Stage a field change.
    ///
    /// Empty keys and keys starting with [`RESERVED_PREFIX`] are silently
    /// ignored: callers may pass whole documents that include metadata.
    /// A deleted entity ignores every change.
    pub fn set(&mut self, key: &str, value: Value) {
        if !is_user_key(key) || self.deleted {
            return;
        }
        self.removed.remove(key);
        self.pending.insert(key.to_string(), value);
    }

    /// Current value: pending wins over committed.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pending.get(key).or_else(|| self.committed.get(key))
    }

    /// Drop a field from both maps and remember the removal.
    /// A deleted entity ignores it.
    pub fn remove(&mut self, key: &str) {
        if !is_user_key(key) || self.deleted {
            return;
        }
        let was_pending = self.pending.remove(key).is_some();
        let was_committed = self.committed.remove(key).is_some();
        if was_committed || (was_pending && self.identity.is_some()) {
            self.removed.insert(key.to_string());
        }
    }

    /// All visible field names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let keys: BTreeSet<&String> = self.committed.keys().chain(self.pending.keys()).collect();
        keys.into_iter().cloned().collect()
    }

    /// Unconfirmed local mutations.
    pub fn pending(&self) -> &Map<String, Value> {
        &self.pending
    }

    /// Last server-confirmed fields.
    pub fn committed(&self) -> &Map<String, Value> {
        &self.committed
    }

    /// Keys removed locally but not yet propagated by a full save.
    pub fn removed_keys(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    /// True if a save would transmit something new.
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty() || !self.removed.is_empty()
    }

    // ---------------------------------------------------------------
    // Metadata
    // ---------------------------------------------------------------

    /// Server-assigned identity, if created.
    pub fn identity(&self) -> Option<&ObjectId> {
        self.identity.as_ref()
    }

    /// Last observed server revision.
    pub fn version(&self) -> Option<&VersionToken> {
        self.version.as_ref()
    }

    /// Creation time in ms, 0 before the first save.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Modification time in ms, 0 before the first save.
    pub fn modified_at(&self) -> i64 {
        self.modified_at
    }

    /// Owner reported by the server.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Application type hint.
    pub fn type_hint(&self) -> Option<&str> {
        self.type_hint.as_deref()
    }

    /// Where this entity is in its lifecycle.
    pub fn lifecycle(&self) -> Lifecycle {
        match (self.deleted, &self.identity) {
            (true, _) => Lifecycle::Deleted,
            (false, Some(_)) => Lifecycle::Saved,
            (false, None) => Lifecycle::Unsaved,
        }
    }

    // ---------------------------------------------------------------
    // Request bodies
    // ---------------------------------------------------------------

    /// Body for a write.
    ///
    /// [`BodyScope::Full`] merges pending over committed; removed keys are
    /// absent from both maps and therefore omitted. [`BodyScope::Pending`]
    /// carries only the staged changes.
    pub fn build_body(&self, scope: BodyScope) -> Map<String, Value> {
        match scope {
            BodyScope::Full => {
                let mut body = self.committed.clone();
                for (key, value) in &self.pending {
                    body.insert(key.clone(), value.clone());
                }
                body
            }
            BodyScope::Pending => self.pending.clone(),
        }
    }

    // ---------------------------------------------------------------
    // Server responses
    // ---------------------------------------------------------------

    /// Apply a server snapshot.
    ///
    /// With `is_patch == false` committed fields are replaced; otherwise the
    /// snapshot is merged on top. Reserved keys go to their metadata slots
    /// and never reach the field map.
    pub fn apply_snapshot(&mut self, snapshot: &Map<String, Value>, is_patch: bool) {
        if !is_patch {
            self.committed.clear();
        }
        for (key, value) in snapshot {
            if is_user_key(key) {
                self.committed.insert(key.clone(), value.clone());
                continue;
            }
            match key.as_str() {
                KEY_ID => {
                    if let Some(id) = value.as_str().and_then(|s| ObjectId::parse(s).ok()) {
                        self.identity = Some(id);
                    }
                }
                KEY_CREATED => {
                    if let Some(ts) = value.as_i64() {
                        self.created_at = ts;
                    }
                }
                KEY_MODIFIED => {
                    if let Some(ts) = value.as_i64() {
                        self.modified_at = ts;
                    }
                }
                KEY_OWNER => self.owner = value.as_str().map(str::to_string),
                KEY_VERSION => {
                    let token = match value {
                        Value::String(s) => VersionToken::new(s),
                        Value::Number(n) => VersionToken::new(&n.to_string()),
                        _ => None,
                    };
                    if token.is_some() {
                        self.version = token;
                    }
                }
                KEY_DATA_TYPE => {
                    if let Some(hint) = value.as_str().filter(|s| !s.is_empty()) {
                        self.type_hint = Some(hint.to_string());
                    }
                }
                _ => {}
            }
        }
    }

    /// Record a successful create.
    ///
    /// The identity is taken separately from `ack`: a create only counts
    /// once the server-assigned id has been validated.
    pub fn on_created(
        &mut self,
        identity: ObjectId,
        ack: &WriteAck,
        version: Option<VersionToken>,
    ) {
        self.identity = Some(identity);
        if let Some(created) = ack.created_at {
            self.created_at = created;
            self.modified_at = ack.modified_at.unwrap_or(created);
        }
        if let Some(hint) = ack.data_type.as_deref().filter(|s| !s.is_empty()) {
            self.type_hint = Some(hint.to_string());
        }
        self.commit_full();
        self.record_version(version);
    }

    /// Record a successful full-field update.
    pub fn on_replaced(&mut self, ack: &WriteAck, version: Option<VersionToken>) {
        if let Some(created) = ack.created_at {
            self.created_at = created;
        }
        if let Some(modified) = ack.modified_at {
            self.modified_at = modified;
        }
        self.commit_full();
        self.record_version(version);
    }

    /// Record a successful partial update.
    ///
    /// The response holds the complete resulting field set and replaces
    /// committed state, so fields dropped server-side disappear locally.
    /// Removal markers are re-applied because a patch never transmits them.
    pub fn on_patched(&mut self, snapshot: &Map<String, Value>, version: Option<VersionToken>) {
        self.apply_snapshot(snapshot, false);
        for key in &self.removed {
            self.committed.remove(key);
        }
        self.pending.clear();
        self.record_version(version);
    }

    /// Record a successful refresh. The server is authoritative afterwards.
    pub fn on_refreshed(
        &mut self,
        snapshot: &Map<String, Value>,
        version: Option<VersionToken>,
        type_hint: Option<String>,
    ) {
        self.apply_snapshot(snapshot, false);
        self.pending.clear();
        self.removed.clear();
        if let Some(hint) = type_hint {
            self.type_hint = Some(hint);
        }
        self.record_version(version);
    }

    /// Record a successful delete. Terminal.
    pub fn on_deleted(&mut self) {
        self.deleted = true;
        self.pending.clear();
        self.removed.clear();
    }

    /// The merged view plus reserved metadata, as a JSON object.
    pub fn to_json(&self) -> Value {
        let mut map = self.build_body(BodyScope::Full);
        if let Some(id) = &self.identity {
            map.insert(KEY_ID.into(), Value::from(id.as_str()));
        }
        if self.created_at != 0 {
            map.insert(KEY_CREATED.into(), Value::from(self.created_at));
        }
        if self.modified_at != 0 {
            map.insert(KEY_MODIFIED.into(), Value::from(self.modified_at));
        }
        if let Some(owner) = &self.owner {
            map.insert(KEY_OWNER.into(), Value::from(owner.as_str()));
        }
        if let Some(version) = &self.version {
            map.insert(KEY_VERSION.into(), Value::from(version.as_str()));
        }
        if let Some(hint) = &self.type_hint {
            map.insert(KEY_DATA_TYPE.into(), Value::from(hint.as_str()));
        }
        Value::Object(map)
    }

    fn commit_full(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.committed.extend(pending);
        self.removed.clear();
    }

    fn record_version(&mut self, version: Option<VersionToken>) {
        if version.is_some() {
            self.version = version;
        }
    }
}
