//! Notification emitter: one account-scoped record per confirmed
//! transition.
//!
//! The emitter does not deduplicate — the executor invokes it exactly
//! once per confirmed transition, and the outer policy is no automatic
//! retries. If that policy ever changes, an idempotency key belongs
//! here.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use waterline_core::model::{CaseKind, Notification};

use crate::store::{RemoteStore, StoreError};

pub struct NotificationEmitter {
    store: Arc<dyn RemoteStore>,
}

impl NotificationEmitter {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Build and append the notification for a confirmed transition.
    /// Returns the written value.
    ///
    /// # Errors
    ///
    /// Propagates the store's write failure; no notification is stored
    /// in that case.
    pub fn emit(
        &self,
        account: &str,
        record_id: &str,
        kind: CaseKind,
        status: &str,
        remarks: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Notification, StoreError> {
        let notification = Notification::new(account, record_id, kind, status, remarks, now);
        self.store.append_notification(account, &notification)?;
        tracing::debug!(account, record_id, status, "notification appended");
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::NotificationEmitter;
    use crate::memory::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use waterline_core::model::CaseKind;

    #[test]
    fn emit_appends_exactly_one_unread_notification() {
        let store = Arc::new(MemoryStore::new());
        let emitter = NotificationEmitter::new(store.clone());
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap();

        let written = emitter
            .emit("123456789", "r-1", CaseKind::Request, "completed", Some("fixed"), now)
            .expect("emit");

        let stored = store.notifications_for("123456789");
        assert_eq!(stored, vec![written.clone()]);
        assert!(!written.read);
        assert_eq!(written.status, "completed");
    }

    #[test]
    fn emit_failure_stores_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_notifications(true);
        let emitter = NotificationEmitter::new(store.clone());
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap();

        assert!(
            emitter
                .emit("42", "l-1", CaseKind::Leak, "resolved", None, now)
                .is_err()
        );
        assert!(store.notifications_for("42").is_empty());
    }
}
