//! Change feed listener: one worker per collection.
//!
//! Each delivered batch is normalized record-by-record and swapped into
//! the projection atomically. A feed error never blanks the projection —
//! the last-known-good snapshot stays visible (stale-but-available) and
//! the error is surfaced to the caller.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use waterline_core::model::CaseKind;
use waterline_core::normalize;

use crate::projection::ProjectionStore;
use crate::store::{FeedMessage, RemoteStore, StoreError, SubscriptionId};

pub struct FeedListener {
    kind: CaseKind,
    collection: String,
    subscription_id: SubscriptionId,
    store: Arc<dyn RemoteStore>,
    handle: Option<JoinHandle<()>>,
    last_error: Arc<Mutex<Option<StoreError>>>,
    batches_applied: Arc<AtomicU64>,
}

impl FeedListener {
    /// Subscribe to `collection` and start applying its batches to the
    /// projection under `kind`.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the subscription cannot be opened;
    /// nothing is spawned in that case.
    pub fn spawn(
        store: Arc<dyn RemoteStore>,
        kind: CaseKind,
        collection: impl Into<String>,
        projection: Arc<ProjectionStore>,
    ) -> Result<Self, StoreError> {
        let collection = collection.into();
        let subscription = store.subscribe(&collection)?;
        let subscription_id = subscription.id();

        let last_error = Arc::new(Mutex::new(None));
        let batches_applied = Arc::new(AtomicU64::new(0));

        let handle = {
            let last_error = Arc::clone(&last_error);
            let batches_applied = Arc::clone(&batches_applied);
            let collection = collection.clone();
            std::thread::spawn(move || {
                while let Some(message) = subscription.recv() {
                    match message {
                        FeedMessage::Batch(docs) => {
                            let now = Utc::now();
                            let cases = docs
                                .iter()
                                .map(|doc| normalize::normalize(kind, &doc.id, &doc.data, now))
                                .collect();
                            projection.replace_all(kind, cases);
                            batches_applied.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(
                                collection = %collection,
                                records = docs.len(),
                                "applied feed batch"
                            );
                        }
                        FeedMessage::Error(err) => {
                            tracing::warn!(
                                collection = %collection,
                                code = %err.code(),
                                "feed error, keeping last snapshot: {err}"
                            );
                            *last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                                Some(err);
                        }
                    }
                }
                tracing::debug!(collection = %collection, "feed ended");
            })
        };

        tracing::info!(collection = %collection, kind = %kind, "feed listener started");
        Ok(Self {
            kind,
            collection,
            subscription_id,
            store,
            handle: Some(handle),
            last_error,
            batches_applied,
        })
    }

    /// Unsubscribe and join the worker. Idempotent; also runs on drop.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.store.unsubscribe(self.subscription_id);
            let _ = handle.join();
            tracing::info!(collection = %self.collection, "feed listener stopped");
        }
    }

    /// Take the most recent subscription error, if any. The projection
    /// still holds its last-known-good contents when this is `Some`.
    #[must_use]
    pub fn take_error(&self) -> Option<StoreError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// How many batches have been applied so far.
    #[must_use]
    pub fn batches_applied(&self) -> u64 {
        self.batches_applied.load(Ordering::Relaxed)
    }

    #[must_use]
    pub const fn kind(&self) -> CaseKind {
        self.kind
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl Drop for FeedListener {
    fn drop(&mut self) {
        self.stop();
    }
}
