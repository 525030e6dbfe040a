//! Console engine facade.
//!
//! Ties the projection, the two feed listeners, and the transition
//! executor together behind the surface the presentation layer consumes.
//! Derivation stays pure (`filter`/`stats` take `now` as an argument);
//! this facade and the other stateful workers are where the wall clock
//! is read.

use chrono::Utc;
use std::sync::Arc;

use waterline_core::config::EngineConfig;
use waterline_core::filter::{self, FilterCriteria};
use waterline_core::model::{Case, CaseKind};
use waterline_core::stats::{self, CaseStats};

use crate::feed::FeedListener;
use crate::projection::ProjectionStore;
use crate::store::{RemoteStore, StoreError};
use crate::transition::{TransitionEngine, TransitionError, TransitionReceipt};

pub struct Engine {
    config: EngineConfig,
    projection: Arc<ProjectionStore>,
    transitions: TransitionEngine,
    listeners: Vec<FeedListener>,
}

impl Engine {
    /// Start the engine: spawn one feed listener per collection and wire
    /// the transition executor over the shared projection.
    ///
    /// # Errors
    ///
    /// Returns the store's error when a subscription cannot be opened;
    /// any listener already started is stopped again.
    pub fn start(store: Arc<dyn RemoteStore>, config: EngineConfig) -> Result<Self, StoreError> {
        let projection = Arc::new(ProjectionStore::new());

        let mut listeners = Vec::with_capacity(CaseKind::ALL.len());
        for kind in CaseKind::ALL {
            listeners.push(FeedListener::spawn(
                Arc::clone(&store),
                kind,
                config.collection_path(kind).to_string(),
                Arc::clone(&projection),
            )?);
        }

        let transitions =
            TransitionEngine::new(store, Arc::clone(&projection), config.clone());
        tracing::info!("console engine started");
        Ok(Self {
            config,
            projection,
            transitions,
            listeners,
        })
    }

    /// Ordered snapshot of one kind's projection.
    #[must_use]
    pub fn snapshot(&self, kind: CaseKind) -> Vec<Case> {
        self.projection.snapshot(kind)
    }

    /// The filtered view for the console's current criteria.
    #[must_use]
    pub fn filtered(&self, kind: CaseKind, criteria: &FilterCriteria) -> Vec<Case> {
        filter::apply(&self.projection.snapshot(kind), criteria, Utc::now())
    }

    /// The dashboard statistics for one kind, honoring the configured
    /// series length.
    #[must_use]
    pub fn stats(&self, kind: CaseKind) -> CaseStats {
        stats::summarize_with_series(
            &self.projection.snapshot(kind),
            Utc::now(),
            self.config.stats.series_days,
        )
    }

    /// Execute one status change. See
    /// [`TransitionEngine::request_transition`].
    ///
    /// # Errors
    ///
    /// Propagates the executor's [`TransitionError`].
    pub fn request_transition(
        &self,
        kind: CaseKind,
        record_id: &str,
        new_status: &str,
        remarks: Option<&str>,
    ) -> Result<TransitionReceipt, TransitionError> {
        self.transitions
            .request_transition(kind, record_id, new_status, remarks)
    }

    /// Take the last subscription error for one kind's feed, if any. The
    /// projection keeps its last-known-good contents regardless.
    #[must_use]
    pub fn feed_error(&self, kind: CaseKind) -> Option<StoreError> {
        self.listeners
            .iter()
            .find(|listener| listener.kind() == kind)
            .and_then(FeedListener::take_error)
    }

    /// Batches applied so far for one kind's feed.
    #[must_use]
    pub fn batches_applied(&self, kind: CaseKind) -> u64 {
        self.listeners
            .iter()
            .find(|listener| listener.kind() == kind)
            .map_or(0, FeedListener::batches_applied)
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stop both feed listeners. Idempotent; dropping the engine does
    /// the same.
    pub fn shutdown(&mut self) {
        for listener in &mut self.listeners {
            listener.stop();
        }
        tracing::info!("console engine stopped");
    }
}
