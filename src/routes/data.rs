//! Data pipeline endpoints: load status, refresh, source selection

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repository::settings;
use crate::models::DataSource;
use crate::services::ingest;
use crate::AppState;

/// Current pipeline status
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStatusResponse {
    /// "loading" | "ready" | "error"
    pub status: String,
    pub data_source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
    pub channel_count: usize,
    pub stream_count: usize,
}

/// GET /api/data/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.state.snapshot().await;

    let status = if snapshot.loading {
        "loading"
    } else if snapshot.data.is_some() {
        "ready"
    } else {
        "error"
    };

    let (channel_count, stream_count, last_updated) = match &snapshot.data {
        Some(data) => (
            data.channels.len(),
            data.streams_by_channel.values().map(Vec::len).sum(),
            Some(data.last_updated),
        ),
        None => (0, 0, None),
    };

    Json(DataStatusResponse {
        status: status.to_string(),
        data_source: snapshot.source,
        error: snapshot.error,
        notice: snapshot.notice,
        from_cache: snapshot.from_cache,
        cache_date: snapshot.cache_date.map(|d| d.to_rfc3339()),
        last_updated,
        channel_count,
        stream_count,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub force: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/data/refresh - start a background refresh.
/// Returns immediately; poll /api/data/status for progress.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let force = payload.map(|Json(r)| r.force).unwrap_or(false);

    if state.state.snapshot().await.loading {
        return Json(RefreshResponse {
            status: "loading".to_string(),
            message: Some("A refresh is already in progress".to_string()),
        });
    }

    ingest::spawn_refresh(state.clone(), force);

    Json(RefreshResponse {
        status: "refreshing".to_string(),
        message: None,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResponse {
    pub success: bool,
    pub data_source: DataSource,
}

/// PUT /api/data/source - select the data source.
/// Clears the in-memory snapshot, persists the choice and starts a refresh.
pub async fn set_source(
    State(state): State<Arc<AppState>>,
    Json(source): Json<DataSource>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let DataSource::CustomM3u { url } = &source {
        if url.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Custom M3U URL is required" })),
            ));
        }
    }

    // Persist the selection alongside the rest of the settings
    let mut current = settings::get(&state.pool).await.map_err(|e| {
        tracing::error!("Failed to load settings: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Failed to load settings" })),
        )
    })?;
    current.data_source = source.clone();
    if let DataSource::CustomM3u { url } = &source {
        current.custom_m3u_url = url.clone();
    }
    settings::save(&state.pool, &current).await.map_err(|e| {
        tracing::error!("Failed to save settings: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Failed to save settings" })),
        )
    })?;

    state.state.set_source(source.clone()).await;
    ingest::spawn_refresh(state.clone(), false);

    Ok(Json(SourceResponse {
        success: true,
        data_source: source,
    }))
}
