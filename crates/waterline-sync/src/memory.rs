//! In-memory implementation of the remote store contract.
//!
//! Reference semantics for the store contract: every mutation
//! re-broadcasts the full collection snapshot (submitted-at descending)
//! to all live subscribers, `patch` is a shallow field merge with
//! last-write-wins, and notifications append under their account. The
//! test suites drive the whole engine through this store; it also doubles
//! as the local-development backend.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};

use waterline_core::model::Notification;
use waterline_core::normalize;

use crate::store::{
    FeedMessage, FieldPatch, RawDoc, RemoteStore, StoreError, Subscription, SubscriptionId,
};

struct Subscriber {
    id: SubscriptionId,
    collection: String,
    tx: Sender<FeedMessage>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<RawDoc>>,
    subscribers: Vec<Subscriber>,
    notifications: HashMap<String, Vec<Notification>>,
    next_subscription: SubscriptionId,
    next_doc: u64,
    patch_calls: u64,
    fail_patches: bool,
    fail_notifications: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a document with a store-assigned id and broadcast the new
    /// snapshot. Returns the id.
    pub fn insert(&self, collection: &str, data: Value) -> String {
        let mut inner = self.guard();
        inner.next_doc += 1;
        let id = format!("doc-{:04}", inner.next_doc);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(RawDoc::new(id.clone(), data));
        Self::broadcast(&mut inner, collection);
        id
    }

    /// Insert a document under a caller-chosen id and broadcast.
    pub fn insert_with_id(&self, collection: &str, id: &str, data: Value) {
        let mut inner = self.guard();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(RawDoc::new(id, data));
        Self::broadcast(&mut inner, collection);
    }

    /// Replace a collection's contents outright and broadcast, as if the
    /// remote store had changed underneath the engine.
    pub fn publish_snapshot(&self, collection: &str, docs: Vec<RawDoc>) {
        let mut inner = self.guard();
        inner.collections.insert(collection.to_string(), docs);
        Self::broadcast(&mut inner, collection);
    }

    /// Push a feed error to every subscriber of `collection`.
    pub fn emit_feed_error(&self, collection: &str, error: &StoreError) {
        let inner = self.guard();
        for sub in inner.subscribers.iter().filter(|s| s.collection == collection) {
            let _ = sub.tx.send(FeedMessage::Error(error.clone()));
        }
    }

    /// Current payload of one document.
    #[must_use]
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.guard()
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(|d| d.data.clone())
    }

    /// Make subsequent `patch` calls fail with a rejected write.
    pub fn set_fail_patches(&self, fail: bool) {
        self.guard().fail_patches = fail;
    }

    /// Make subsequent notification appends fail with a rejected write.
    pub fn set_fail_notifications(&self, fail: bool) {
        self.guard().fail_notifications = fail;
    }

    /// How many `patch` calls reached the store (including failed ones).
    #[must_use]
    pub fn patch_calls(&self) -> u64 {
        self.guard().patch_calls
    }

    /// Notifications appended under one account, in append order.
    #[must_use]
    pub fn notifications_for(&self, account: &str) -> Vec<Notification> {
        self.guard()
            .notifications
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    /// Live subscriber count for one collection.
    #[must_use]
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.guard()
            .subscribers
            .iter()
            .filter(|s| s.collection == collection)
            .count()
    }

    fn broadcast(inner: &mut Inner, collection: &str) {
        let snapshot = Self::sorted(
            inner
                .collections
                .get(collection)
                .map_or(&[][..], Vec::as_slice),
        );
        inner.subscribers.retain(|sub| {
            sub.collection != collection
                || sub.tx.send(FeedMessage::Batch(snapshot.clone())).is_ok()
        });
    }

    // The remote query contract: full snapshot ordered by timestamp
    // descending. Ties keep insertion order (stable sort).
    fn sorted(docs: &[RawDoc]) -> Vec<RawDoc> {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        let mut snapshot = docs.to_vec();
        snapshot.sort_by_key(|doc| {
            std::cmp::Reverse(normalize::coerce_timestamp(doc.data.get("timestamp"), epoch))
        });
        snapshot
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let mut inner = self.guard();
        inner.next_subscription += 1;
        let id = inner.next_subscription;

        let (tx, rx) = mpsc::channel();
        let snapshot = Self::sorted(
            inner
                .collections
                .get(collection)
                .map_or(&[][..], Vec::as_slice),
        );
        let _ = tx.send(FeedMessage::Batch(snapshot));

        inner.subscribers.push(Subscriber {
            id,
            collection: collection.to_string(),
            tx,
        });
        Ok(Subscription::new(id, rx))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.guard().subscribers.retain(|s| s.id != id);
    }

    fn patch(&self, collection: &str, id: &str, patch: &FieldPatch) -> Result<(), StoreError> {
        let mut inner = self.guard();
        inner.patch_calls += 1;

        if inner.fail_patches {
            return Err(StoreError::WriteRejected {
                collection: collection.to_string(),
                id: id.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        patch.apply_to(&mut doc.data);

        Self::broadcast(&mut inner, collection);
        Ok(())
    }

    fn append_notification(
        &self,
        account: &str,
        notification: &Notification,
    ) -> Result<(), StoreError> {
        let mut inner = self.guard();
        if inner.fail_notifications {
            return Err(StoreError::WriteRejected {
                collection: "notifications".to_string(),
                id: account.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        inner
            .notifications
            .entry(account.to_string())
            .or_default()
            .push(notification.clone());
        Ok(())
    }
}
