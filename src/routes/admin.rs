//! Admin/Management endpoints for database operations

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repository::{channels, favorites, metadata, recently_played, settings, streams};
use crate::AppState;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

/// Query params for admin operations
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    /// Admin key for authorization (simple protection)
    pub key: Option<String>,
}

/// Counts of deleted records
#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCounts {
    pub channels: u64,
    pub stream_lists: u64,
    pub metadata: u64,
    pub favorites: u64,
    pub recently_played: u64,
    pub settings: u64,
}

/// Response for delete operations
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted: DeletedCounts,
}

/// Stats response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStatsResponse {
    pub channels: i64,
    pub stream_lists: i64,
    pub favorites: i64,
    pub recently_played: i64,
    pub cache_present: bool,
}

/// Validate admin key
fn validate_admin_key(provided_key: Option<&str>) -> bool {
    let admin_key = std::env::var("ADMIN_KEY").unwrap_or_else(|_| "admin123".to_string());

    match provided_key {
        Some(key) => key == admin_key,
        None => false,
    }
}

fn unauthorized() -> ErrorResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "Invalid or missing admin key" })),
    )
}

fn db_error(e: sqlx::Error) -> ErrorResponse {
    tracing::error!("Admin query failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Database error" })),
    )
}

/// DELETE /api/admin/cache - wipe the channel-data cache only.
/// Favorites, recently-played and settings are untouched.
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if !validate_admin_key(query.key.as_deref()) {
        return Err(unauthorized());
    }

    let deleted = DeletedCounts {
        channels: channels::clear(&state.pool).await.map_err(db_error)?,
        stream_lists: streams::clear(&state.pool).await.map_err(db_error)?,
        metadata: metadata::clear(&state.pool).await.map_err(db_error)?,
        ..Default::default()
    };

    tracing::info!("Admin: cleared channel data cache ({} channels)", deleted.channels);

    Ok(Json(DeleteResponse {
        success: true,
        message: "Channel data cache cleared".to_string(),
        deleted,
    }))
}

/// DELETE /api/admin/all - wipe everything, including user state
pub async fn clear_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if !validate_admin_key(query.key.as_deref()) {
        return Err(unauthorized());
    }

    let deleted = DeletedCounts {
        channels: channels::clear(&state.pool).await.map_err(db_error)?,
        stream_lists: streams::clear(&state.pool).await.map_err(db_error)?,
        metadata: metadata::clear(&state.pool).await.map_err(db_error)?,
        favorites: favorites::clear(&state.pool).await.map_err(db_error)?,
        recently_played: recently_played::clear(&state.pool).await.map_err(db_error)?,
        settings: settings::clear(&state.pool).await.map_err(db_error)?,
    };

    tracing::info!("Admin: cleared all stores");

    Ok(Json(DeleteResponse {
        success: true,
        message: "All data cleared".to_string(),
        deleted,
    }))
}

/// GET /api/admin/stats
pub async fn get_db_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if !validate_admin_key(query.key.as_deref()) {
        return Err(unauthorized());
    }

    let stats = DbStatsResponse {
        channels: channels::count(&state.pool).await.map_err(db_error)?,
        stream_lists: streams::count_rows(&state.pool).await.map_err(db_error)?,
        favorites: favorites::count(&state.pool).await.map_err(db_error)?,
        recently_played: recently_played::count(&state.pool).await.map_err(db_error)?,
        cache_present: metadata::get(&state.pool).await.map_err(db_error)?.is_some(),
    };

    Ok(Json(stats))
}
