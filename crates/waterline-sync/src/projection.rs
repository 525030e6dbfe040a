//! The in-memory projection of remote case records.
//!
//! Single source of truth for everything downstream of the feed. All
//! mutations go through one mutex (single-writer discipline): a
//! feed-driven `replace_all` and a transition-driven `apply_local` never
//! interleave partially, and readers always get a complete snapshot.
//! Order is preserved exactly as delivered by the feed; the store never
//! re-sorts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use waterline_core::model::{Case, CaseKind};

#[derive(Debug, Default)]
pub struct ProjectionStore {
    collections: Mutex<HashMap<CaseKind, Vec<Case>>>,
}

impl ProjectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<CaseKind, Vec<Case>>> {
        // A poisoned lock only means a writer panicked mid-swap; the map
        // itself is still a complete previous state.
        self.collections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically replace the projection for one kind with a freshly
    /// normalized feed batch. Readers never observe a partial batch.
    pub fn replace_all(&self, kind: CaseKind, cases: Vec<Case>) {
        self.guard().insert(kind, cases);
    }

    /// Apply a local (optimistic) mutation to one record, immediately
    /// visible to readers. Returns false when the record is not present;
    /// a later feed batch is always authoritative over this write.
    pub fn apply_local<F>(&self, kind: CaseKind, id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut Case),
    {
        let mut guard = self.guard();
        match guard
            .get_mut(&kind)
            .and_then(|cases| cases.iter_mut().find(|c| c.id() == id))
        {
            Some(case) => {
                mutate(case);
                true
            }
            None => false,
        }
    }

    /// Ordered snapshot of one kind's records, cloned out so readers
    /// hold no lock while deriving views.
    #[must_use]
    pub fn snapshot(&self, kind: CaseKind) -> Vec<Case> {
        self.guard().get(&kind).cloned().unwrap_or_default()
    }

    /// Look up one record by id.
    #[must_use]
    pub fn get(&self, kind: CaseKind, id: &str) -> Option<Case> {
        self.guard()
            .get(&kind)
            .and_then(|cases| cases.iter().find(|c| c.id() == id))
            .cloned()
    }

    #[must_use]
    pub fn len(&self, kind: CaseKind) -> usize {
        self.guard().get(&kind).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self, kind: CaseKind) -> bool {
        self.len(kind) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectionStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use waterline_core::model::{Case, CaseKind, RequestStatus, ServiceRequest};

    fn request(id: &str, status: RequestStatus) -> Case {
        Case::Request(ServiceRequest {
            id: id.to_string(),
            account_number: "1".to_string(),
            service_id: String::new(),
            email: String::new(),
            subject: String::new(),
            description: String::new(),
            request_type: "repair".to_string(),
            status,
            submitted_at: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
            attachment_uri: None,
            remarks: None,
        })
    }

    #[test]
    fn replace_all_swaps_contents_and_preserves_order() {
        let store = ProjectionStore::new();
        store.replace_all(
            CaseKind::Request,
            vec![request("b", RequestStatus::Pending), request("a", RequestStatus::Pending)],
        );
        let ids: Vec<String> = store
            .snapshot(CaseKind::Request)
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, ["b", "a"], "feed order is kept verbatim");

        store.replace_all(CaseKind::Request, vec![request("c", RequestStatus::Pending)]);
        assert_eq!(store.len(CaseKind::Request), 1);
    }

    #[test]
    fn kinds_are_independent() {
        let store = ProjectionStore::new();
        store.replace_all(CaseKind::Request, vec![request("a", RequestStatus::Pending)]);
        assert!(store.is_empty(CaseKind::Leak));
        assert_eq!(store.len(CaseKind::Request), 1);
    }

    #[test]
    fn apply_local_mutates_in_place() {
        let store = ProjectionStore::new();
        store.replace_all(CaseKind::Request, vec![request("a", RequestStatus::Pending)]);

        let applied = store.apply_local(CaseKind::Request, "a", |case| {
            if let Case::Request(r) = case {
                r.status = RequestStatus::Completed;
                r.remarks = Some("fixed".to_string());
            }
        });
        assert!(applied);

        let case = store.get(CaseKind::Request, "a").expect("present");
        assert_eq!(case.status_label(), "completed");
        assert_eq!(case.remarks(), Some("fixed"));
    }

    #[test]
    fn apply_local_unknown_record_is_a_no_op() {
        let store = ProjectionStore::new();
        assert!(!store.apply_local(CaseKind::Request, "ghost", |_| {}));
    }

    #[test]
    fn feed_batch_overwrites_optimistic_state() {
        let store = ProjectionStore::new();
        store.replace_all(CaseKind::Request, vec![request("a", RequestStatus::Pending)]);
        store.apply_local(CaseKind::Request, "a", |case| {
            if let Case::Request(r) = case {
                r.status = RequestStatus::Completed;
            }
        });

        // The next authoritative batch still says pending.
        store.replace_all(CaseKind::Request, vec![request("a", RequestStatus::Pending)]);
        let case = store.get(CaseKind::Request, "a").expect("present");
        assert_eq!(case.status_label(), "pending");
    }

    #[test]
    fn snapshots_are_detached_copies() {
        let store = ProjectionStore::new();
        store.replace_all(CaseKind::Request, vec![request("a", RequestStatus::Pending)]);
        let mut snapshot = store.snapshot(CaseKind::Request);
        snapshot.clear();
        assert_eq!(store.len(CaseKind::Request), 1);
    }

    #[test]
    fn concurrent_writers_serialize_without_tearing() {
        let store = Arc::new(ProjectionStore::new());
        store.replace_all(CaseKind::Request, vec![request("a", RequestStatus::Pending)]);

        let replacer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    store.replace_all(
                        CaseKind::Request,
                        vec![request("a", RequestStatus::Pending), request("b", RequestStatus::Pending)],
                    );
                }
            })
        };
        let mutator = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    store.apply_local(CaseKind::Request, "a", |case| {
                        if let Case::Request(r) = case {
                            r.status = RequestStatus::InProgress;
                        }
                    });
                }
            })
        };
        replacer.join().expect("replacer thread");
        mutator.join().expect("mutator thread");

        // Every read sees a complete batch: one or two records, never a
        // half-applied swap.
        let len = store.len(CaseKind::Request);
        assert!(len == 1 || len == 2);
    }
}
