//! The remote record store contract.
//!
//! The engine consumes, never owns, the store: a full-snapshot
//! subscription per collection, a field-level patch for updates, and an
//! append-only notification write. There is no compare-and-swap — last
//! write wins on the remote side.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use waterline_core::error::ErrorCode;
use waterline_core::model::{LeakStatus, Notification, RequestStatus};

/// Handle identifying one live subscription.
pub type SubscriptionId = u64;

/// One raw document as delivered by the store: the store-assigned id
/// plus the loosely-shaped payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDoc {
    pub id: String,
    pub data: Value,
}

impl RawDoc {
    #[must_use]
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self { id: id.into(), data }
    }
}

/// One message on a subscription feed. A batch is the *full* ordered set
/// of currently-live records (submitted-at descending), not a diff.
#[derive(Debug, Clone)]
pub enum FeedMessage {
    Batch(Vec<RawDoc>),
    Error(StoreError),
}

/// Recoverable store failures. Nothing here is fatal to the engine: the
/// worst outcome is a stale view or a refused write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("subscription to '{collection}' denied: {reason}")]
    SubscriptionDenied { collection: String, reason: String },
    #[error("record feed disconnected: {0}")]
    Disconnected(String),
    #[error("write to '{collection}/{id}' rejected: {reason}")]
    WriteRejected {
        collection: String,
        id: String,
        reason: String,
    },
    #[error("document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },
}

impl StoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SubscriptionDenied { .. } | Self::Disconnected(_) => ErrorCode::SubscriptionLost,
            Self::WriteRejected { .. } | Self::NotFound { .. } => ErrorCode::RemoteWriteFailed,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// A live feed of snapshot batches for one collection.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: Receiver<FeedMessage>,
}

impl Subscription {
    pub(crate) const fn new(id: SubscriptionId, rx: Receiver<FeedMessage>) -> Self {
        Self { id, rx }
    }

    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Block for the next message. `None` means the feed has ended
    /// (unsubscribed or the store shut down).
    #[must_use]
    pub fn recv(&self) -> Option<FeedMessage> {
        self.rx.recv().ok()
    }

    /// Non-blocking variant of [`Subscription::recv`].
    #[must_use]
    pub fn try_recv(&self) -> Option<FeedMessage> {
        self.rx.try_recv().ok()
    }
}

/// A field-level patch: only the named fields change, sibling fields in
/// the remote document survive untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    fields: BTreeMap<String, Value>,
}

impl FieldPatch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add one field to the patch.
    #[must_use]
    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// The patch for a service request transition: `status` plus
    /// `remarks` when given.
    #[must_use]
    pub fn request_status(status: RequestStatus, remarks: Option<&str>) -> Self {
        let patch = Self::new().set("status", Value::String(status.to_string()));
        match remarks {
            Some(r) => patch.set("remarks", Value::String(r.to_string())),
            None => patch,
        }
    }

    /// The patch for a leak report transition. Both flags are always
    /// written so the remote record can never end up with both set.
    #[must_use]
    pub fn leak_status(status: LeakStatus, remarks: Option<&str>) -> Self {
        let (resolved, rejected) = status.flags();
        let patch = Self::new()
            .set("resolved", Value::Bool(resolved))
            .set("rejected", Value::Bool(rejected));
        match remarks {
            Some(r) => patch.set("remarks", Value::String(r.to_string())),
            None => patch,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Shallow-merge the patch into a document payload. A non-object
    /// target is replaced by an object first.
    pub fn apply_to(&self, target: &mut Value) {
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Value::Object(map) = target {
            for (key, value) in &self.fields {
                map.insert(key.clone(), value.clone());
            }
        }
    }
}

/// The subscribe/query/update contract against the remote record store.
///
/// Implementations must be shareable across threads; the engine calls
/// `patch` and `append_notification` from the transition path while a
/// feed subscription is live.
pub trait RemoteStore: Send + Sync {
    /// Open a full-snapshot subscription to `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SubscriptionDenied`] (or a transport
    /// failure) when the feed cannot be opened.
    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError>;

    /// Halt delivery for a subscription. Idempotent: unknown ids are
    /// ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Apply a field-level patch to one document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown document or
    /// [`StoreError::WriteRejected`] when the store refuses the write.
    fn patch(&self, collection: &str, id: &str, patch: &FieldPatch) -> Result<(), StoreError>;

    /// Append one notification under the account's records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteRejected`] when the store refuses the
    /// write.
    fn append_notification(&self, account: &str, notification: &Notification)
    -> Result<(), StoreError>;
}
