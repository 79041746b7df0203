//! Recently-played endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repository::recently_played;
use crate::models::RecentlyPlayed;
use crate::AppState;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn db_error(e: sqlx::Error) -> ErrorResponse {
    tracing::error!("Recently-played query failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Database error" })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPlayRequest {
    pub channel_id: String,
    pub stream_url: String,
    /// Playback duration in seconds
    #[serde(default)]
    pub duration: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyPlayedResponse {
    pub recently_played: Vec<RecentlyPlayed>,
    pub total: usize,
}

/// GET /api/recently-played - most recent plays first
pub async fn list_recently_played(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let rows = recently_played::get_recent(&state.pool, query.limit.max(1))
        .await
        .map_err(db_error)?;
    let recently_played: Vec<RecentlyPlayed> = rows.into_iter().map(Into::into).collect();
    let total = recently_played.len();

    Ok(Json(RecentlyPlayedResponse {
        recently_played,
        total,
    }))
}

/// POST /api/recently-played
pub async fn record_play(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecordPlayRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if payload.channel_id.is_empty() || payload.stream_url.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "channelId and streamUrl are required" })),
        ));
    }

    let entry = RecentlyPlayed {
        channel_id: payload.channel_id,
        stream_url: payload.stream_url,
        played_at: Utc::now().timestamp_millis(),
        duration: payload.duration,
    };
    recently_played::record(
        &state.pool,
        &entry.channel_id,
        &entry.stream_url,
        entry.played_at,
        entry.duration,
    )
    .await
    .map_err(db_error)?;

    Ok((StatusCode::CREATED, Json(entry)))
}
