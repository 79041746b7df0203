//! Favorites endpoints
//!
//! Favorites are user state in their own keyspace, never touched by the
//! channel-data TTL/version logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repository::favorites;
use crate::models::Favorite;
use crate::AppState;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn db_error(e: sqlx::Error) -> ErrorResponse {
    tracing::error!("Favorites query failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Database error" })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub channel_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesResponse {
    pub favorites: Vec<Favorite>,
    pub total: usize,
}

/// GET /api/favorites - all favorites in add-time order
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let rows = favorites::get_all(&state.pool).await.map_err(db_error)?;
    let favorites: Vec<Favorite> = rows.into_iter().map(Into::into).collect();
    let total = favorites.len();

    Ok(Json(FavoritesResponse { favorites, total }))
}

/// POST /api/favorites
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddFavoriteRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    if payload.channel_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "channelId is required" })),
        ));
    }

    let favorite = Favorite {
        channel_id: payload.channel_id,
        added_at: Utc::now().timestamp_millis(),
    };
    favorites::add(&state.pool, &favorite.channel_id, favorite.added_at)
        .await
        .map_err(db_error)?;

    Ok((StatusCode::CREATED, Json(favorite)))
}

/// DELETE /api/favorites/:channel_id
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let removed = favorites::remove(&state.pool, &channel_id)
        .await
        .map_err(db_error)?;

    if removed == 0 {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Favorite not found" })),
        ));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
