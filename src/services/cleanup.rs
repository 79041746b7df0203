//! Background maintenance
//!
//! Runs periodically after startup:
//! - refreshes channel data once the cached snapshot goes stale
//! - prunes recently-played history down to a bounded size

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;
use tracing::{info, warn};

use crate::db::repository::{metadata, recently_played};
use crate::services::ingest::{self, CACHE_VERSION};
use crate::AppState;

/// Prune playback history; errors are logged, never fatal
pub async fn run_maintenance(state: &AppState) {
    match recently_played::prune(&state.pool, state.config.max_recently_played).await {
        Ok(deleted) if deleted > 0 => {
            info!("Maintenance: pruned {} recently-played entries", deleted);
        }
        Ok(_) => {}
        Err(e) => warn!("Maintenance: history pruning failed: {}", e),
    }
}

/// Whether the cached snapshot needs a refresh (stale or outdated schema).
/// An absent cache is left to the startup load path.
async fn cache_needs_refresh(state: &AppState) -> bool {
    match metadata::get(&state.pool).await {
        Ok(Some(meta)) => {
            meta.version < CACHE_VERSION || meta.is_expired(Utc::now().timestamp_millis())
        }
        Ok(None) => false,
        Err(e) => {
            warn!("Maintenance: metadata read failed: {}", e);
            false
        }
    }
}

/// Start the background maintenance task.
///
/// This should be spawned as a background task using `tokio::spawn`.
pub async fn start_maintenance_task(state: Arc<AppState>) {
    info!(
        "Starting maintenance task (interval: {}s, max_history: {})",
        state.config.maintenance_interval_secs, state.config.max_recently_played
    );

    let mut interval = time::interval(Duration::from_secs(state.config.maintenance_interval_secs));
    // The first tick fires immediately; the startup load is already running
    interval.tick().await;

    loop {
        interval.tick().await;

        run_maintenance(&state).await;

        if cache_needs_refresh(&state).await && !state.state.snapshot().await.loading {
            info!("Cached data expired, refreshing");
            ingest::spawn_refresh(state.clone(), false);
        }
    }
}
