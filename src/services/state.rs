//! Observable application state
//!
//! Process-wide state (data snapshot, loading flag, error, selected source)
//! owned by the composition root. Mutations go through the store, which
//! bumps a `watch` channel so subscribers can react to changes. Fetch
//! results are applied only when the source they were fetched for still
//! matches the current selection, so superseded requests are discarded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};

use crate::models::{DataSource, NormalizedData};
use crate::services::ingest::FetchOutcome;

/// Current app state, cloned out for request handlers
#[derive(Debug, Clone)]
pub struct DataState {
    pub data: Option<Arc<NormalizedData>>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub from_cache: bool,
    pub cache_date: Option<DateTime<Utc>>,
    pub source: DataSource,
}

/// State container with subscriber notification
pub struct StateStore {
    inner: RwLock<DataState>,
    changes: watch::Sender<u64>,
}

impl StateStore {
    pub fn new(source: DataSource) -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            inner: RwLock::new(DataState {
                data: None,
                loading: true,
                error: None,
                notice: None,
                from_cache: false,
                cache_date: None,
                source,
            }),
            changes,
        }
    }

    fn bump(&self) {
        self.changes.send_modify(|v| *v += 1);
    }

    /// Subscribe to change notifications (value is a monotonic revision)
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub async fn snapshot(&self) -> DataState {
        self.inner.read().await.clone()
    }

    pub async fn data(&self) -> Option<Arc<NormalizedData>> {
        self.inner.read().await.data.clone()
    }

    /// Mark a refresh as started and return the source it runs against
    pub async fn begin_loading(&self) -> DataSource {
        let mut state = self.inner.write().await;
        state.loading = true;
        let source = state.source.clone();
        drop(state);
        self.bump();
        source
    }

    /// Select a new data source: clears the snapshot and enters loading
    pub async fn set_source(&self, source: DataSource) {
        let mut state = self.inner.write().await;
        if state.source == source {
            return;
        }
        state.source = source;
        state.data = None;
        state.error = None;
        state.notice = None;
        state.loading = true;
        drop(state);
        self.bump();
    }

    /// Apply a fetch result. Returns false (and changes nothing) when the
    /// selection moved on while the fetch was in flight.
    pub async fn apply_result(&self, fetched_for: &DataSource, outcome: FetchOutcome) -> bool {
        let mut state = self.inner.write().await;
        if &state.source != fetched_for {
            return false;
        }
        state.data = Some(outcome.data);
        state.loading = false;
        state.error = None;
        state.notice = outcome.notice;
        state.from_cache = outcome.from_cache;
        state.cache_date = outcome.cache_date;
        drop(state);
        self.bump();
        true
    }

    /// Record a fetch failure, unless the selection moved on
    pub async fn apply_error(&self, fetched_for: &DataSource, message: &str) -> bool {
        let mut state = self.inner.write().await;
        if &state.source != fetched_for {
            return false;
        }
        state.error = Some(message.to_string());
        state.loading = false;
        drop(state);
        self.bump();
        true
    }
}
