//! Settings endpoints
//!
//! GET returns the full settings value; PUT merges a partial update. A
//! data-source change in the update also re-points the pipeline and starts
//! a refresh, so the two stay consistent.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::db::repository::settings;
use crate::models::SettingsUpdate;
use crate::services::ingest;
use crate::AppState;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn db_error(e: sqlx::Error) -> ErrorResponse {
    tracing::error!("Settings query failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Database error" })),
    )
}

/// GET /api/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let current = settings::get(&state.pool).await.map_err(db_error)?;

    Ok(Json(current))
}

/// PUT /api/settings - partial merge
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let new_source = update.data_source.clone();

    let mut current = settings::get(&state.pool).await.map_err(db_error)?;
    current.apply(update);
    settings::save(&state.pool, &current).await.map_err(db_error)?;

    if let Some(source) = new_source {
        if state.state.snapshot().await.source != source {
            state.state.set_source(source).await;
            ingest::spawn_refresh(state.clone(), false);
        }
    }

    Ok(Json(current))
}
