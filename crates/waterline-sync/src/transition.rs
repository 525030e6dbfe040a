//! Transition validation and execution.
//!
//! Order of operations is the contract: refuse a second in-flight
//! request for the same record, validate the target status against the
//! record's kind, patch the remote store, and only then apply the
//! optimistic local update and emit the notification. A notification is
//! a side effect of a confirmed remote change, never of an operator
//! click.

use chrono::Utc;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use waterline_core::config::EngineConfig;
use waterline_core::error::ErrorCode;
use waterline_core::model::{Case, CaseKind, LeakStatus, Notification, RequestStatus};

use crate::notify::NotificationEmitter;
use crate::projection::ProjectionStore;
use crate::store::{FieldPatch, RemoteStore, StoreError};

/// Outcome of a fully confirmed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReceipt {
    pub record_id: String,
    pub account_number: String,
    pub kind: CaseKind,
    pub status: String,
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("a transition is already in flight for '{record_id}'")]
    InFlight { record_id: String },
    #[error("unknown record '{record_id}'")]
    UnknownRecord { record_id: String },
    #[error("'{value}' is not a valid {kind} status")]
    UnknownStatus { kind: CaseKind, value: String },
    #[error("remote status update failed: {source}")]
    RemoteWrite {
        #[source]
        source: StoreError,
    },
    #[error("status updated but notification write failed: {source}")]
    NotificationFailed {
        #[source]
        source: StoreError,
    },
}

impl TransitionError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InFlight { .. } => ErrorCode::TransitionInFlight,
            Self::UnknownRecord { .. } => ErrorCode::RecordNotFound,
            Self::UnknownStatus { .. } => ErrorCode::InvalidStatusValue,
            Self::RemoteWrite { .. } => ErrorCode::RemoteWriteFailed,
            Self::NotificationFailed { .. } => ErrorCode::NotificationWriteFailed,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Kind-checked target status for one transition.
#[derive(Debug, Clone, Copy)]
enum TargetStatus {
    Request(RequestStatus),
    Leak(LeakStatus),
}

impl TargetStatus {
    fn parse(kind: CaseKind, value: &str) -> Result<Self, TransitionError> {
        let parsed = match kind {
            CaseKind::Request => RequestStatus::from_str(value).map(Self::Request),
            CaseKind::Leak => LeakStatus::from_str(value).map(Self::Leak),
        };
        parsed.map_err(|_| TransitionError::UnknownStatus {
            kind,
            value: value.to_string(),
        })
    }

    fn patch(self, remarks: Option<&str>) -> FieldPatch {
        match self {
            Self::Request(status) => FieldPatch::request_status(status, remarks),
            Self::Leak(status) => FieldPatch::leak_status(status, remarks),
        }
    }

    fn label(self) -> String {
        match self {
            Self::Request(status) => status.to_string(),
            Self::Leak(status) => status.to_string(),
        }
    }
}

/// RAII membership in the in-flight set; removed on drop so the lock is
/// released on every exit path, success or failure.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    record_id: String,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, record_id: &str) -> Option<Self> {
        let mut guard = set.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.insert(record_id.to_string()) {
            Some(Self {
                set: Arc::clone(set),
                record_id: record_id.to_string(),
            })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.record_id);
    }
}

pub struct TransitionEngine {
    store: Arc<dyn RemoteStore>,
    projection: Arc<ProjectionStore>,
    emitter: NotificationEmitter,
    config: EngineConfig,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl TransitionEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn RemoteStore>,
        projection: Arc<ProjectionStore>,
        config: EngineConfig,
    ) -> Self {
        let emitter = NotificationEmitter::new(Arc::clone(&store));
        Self {
            store,
            projection,
            emitter,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Execute one status change for `record_id`.
    ///
    /// Validation failures (unknown record, unknown status, transition
    /// already in flight) are rejected locally without contacting the
    /// store. A remote write failure leaves the projection untouched. On
    /// success the projection reflects the change immediately and exactly
    /// one notification is appended for the case's account — in that
    /// order.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] naming which step refused or failed;
    /// `NotificationFailed` means the status change itself is already
    /// durable.
    pub fn request_transition(
        &self,
        kind: CaseKind,
        record_id: &str,
        new_status: &str,
        remarks: Option<&str>,
    ) -> Result<TransitionReceipt, TransitionError> {
        let _guard = InFlightGuard::acquire(&self.in_flight, record_id).ok_or_else(|| {
            TransitionError::InFlight {
                record_id: record_id.to_string(),
            }
        })?;

        let case = self.projection.get(kind, record_id).ok_or_else(|| {
            TransitionError::UnknownRecord {
                record_id: record_id.to_string(),
            }
        })?;

        let target = TargetStatus::parse(kind, new_status)?;
        let status = target.label();

        let collection = self.config.collection_path(kind);
        self.store
            .patch(collection, record_id, &target.patch(remarks))
            .map_err(|source| TransitionError::RemoteWrite { source })?;

        let applied = self.projection.apply_local(kind, record_id, |case| {
            apply_status(case, target, remarks);
        });
        if !applied {
            // The feed removed the record between lookup and apply; the
            // next batch is authoritative either way.
            tracing::warn!(record_id, "record vanished before optimistic update");
        }
        tracing::info!(record_id, status = %status, "transition confirmed");

        let notification = self
            .emitter
            .emit(
                case.account_number(),
                record_id,
                kind,
                &status,
                remarks,
                Utc::now(),
            )
            .map_err(|source| TransitionError::NotificationFailed { source })?;

        Ok(TransitionReceipt {
            record_id: record_id.to_string(),
            account_number: case.account_number().to_string(),
            kind,
            status,
            notification,
        })
    }

    /// Whether a transition is currently in flight for `record_id`.
    #[must_use]
    pub fn is_in_flight(&self, record_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(record_id)
    }
}

fn apply_status(case: &mut Case, target: TargetStatus, remarks: Option<&str>) {
    match (case, target) {
        (Case::Request(request), TargetStatus::Request(status)) => {
            request.status = status;
            if let Some(r) = remarks {
                request.remarks = Some(r.to_string());
            }
        }
        (Case::Leak(leak), TargetStatus::Leak(status)) => {
            leak.status = status;
            if let Some(r) = remarks {
                leak.remarks = Some(r.to_string());
            }
        }
        // Unreachable by construction: the target was parsed for the
        // record's own kind.
        _ => {}
    }
}
