//! Channel browsing endpoints
//!
//! All reads go against the in-memory normalized snapshot. While no snapshot
//! is available the endpoints answer 503 with a loading or error body.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repository::{favorites, settings};
use crate::models::{
    Channel, ChannelFilters, ChannelsQuery, ChannelsResponse, Country, Language, NormalizedData,
    Stream,
};
use crate::services::filter::{detect_mixed_content, filter_channels, MixedContentInfo};
use crate::AppState;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

/// The current snapshot, or a 503 while data is loading/failed
async fn current_data(state: &AppState) -> Result<Arc<NormalizedData>, ErrorResponse> {
    let snapshot = state.state.snapshot().await;

    match snapshot.data {
        Some(data) => Ok(data),
        None if snapshot.loading => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "loading" })),
        )),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "error",
                "error": snapshot
                    .error
                    .unwrap_or_else(|| "Channel data unavailable".to_string()),
            })),
        )),
    }
}

fn internal_error(e: impl std::fmt::Display, what: &str) -> ErrorResponse {
    tracing::error!("{}: {}", what, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": what })),
    )
}

/// GET /api/channels - filtered, paginated channel listing
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChannelsQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let data = current_data(&state).await?;

    // The NSFW default comes from the persisted settings
    let hide_nsfw = match query.hide_nsfw {
        Some(explicit) => explicit,
        None => settings::get(&state.pool)
            .await
            .map(|s| s.hide_nsfw)
            .unwrap_or(true),
    };

    let filters = ChannelFilters {
        query: query.q,
        country: query.country,
        category: query.category,
        language: query.language,
        stream_filter: query.streams.unwrap_or_default(),
        hide_nsfw,
    };

    let filtered = filter_channels(&data, &filters);
    let total = filtered.len();

    let limit = query.limit.min(state.config.max_channels_page);
    let offset = query.offset;
    let channels: Vec<Channel> = filtered
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    let has_more = offset + channels.len() < total;

    Ok(Json(ChannelsResponse {
        channels,
        total,
        limit,
        offset,
        has_more,
    }))
}

/// Channel detail with derived fields
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDetailResponse {
    #[serde(flatten)]
    pub channel: Channel,
    pub stream_count: usize,
    pub is_favorite: bool,
}

/// GET /api/channels/:id
pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let data = current_data(&state).await?;

    let channel = data.channels.get(&id).cloned().ok_or((
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Channel not found" })),
    ))?;

    let is_favorite = favorites::is_favorite(&state.pool, &id)
        .await
        .map_err(|e| internal_error(e, "Failed to read favorites"))?;

    Ok(Json(ChannelDetailResponse {
        stream_count: data.stream_count(&id),
        channel,
        is_favorite,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StreamsQuery {
    /// Protocol the client app is served over ("http:" or "https:")
    #[serde(default)]
    pub app_protocol: Option<String>,
}

/// Stream with its mixed-content classification
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedStream {
    #[serde(flatten)]
    pub stream: Stream,
    pub mixed_content: MixedContentInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamsResponse {
    pub streams: Vec<AnnotatedStream>,
    pub total: usize,
}

/// GET /api/channels/:id/streams
///
/// Streams are annotated with mixed-content info for the given app protocol.
/// With the hide-HTTP-streams setting enabled, mixed-content streams are
/// filtered out entirely.
pub async fn get_channel_streams(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<StreamsQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let data = current_data(&state).await?;

    if !data.channels.contains_key(&id) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Channel not found" })),
        ));
    }

    let hide_http = settings::get(&state.pool)
        .await
        .map(|s| s.hide_http_streams)
        .unwrap_or(false);

    let app_protocol = match query.app_protocol.as_deref() {
        Some("https") | Some("https:") => "https:",
        _ => "http:",
    };

    let streams: Vec<AnnotatedStream> = data
        .streams_by_channel
        .get(&id)
        .map(|s| s.as_slice())
        .unwrap_or(&[])
        .iter()
        .map(|stream| AnnotatedStream {
            mixed_content: detect_mixed_content(&stream.url, app_protocol),
            stream: stream.clone(),
        })
        .filter(|s| !(hide_http && s.mixed_content.is_mixed_content))
        .collect();

    let total = streams.len();

    Ok(Json(StreamsResponse { streams, total }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryEntry {
    #[serde(flatten)]
    pub country: Country,
    pub channel_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountriesResponse {
    pub countries: Vec<CountryEntry>,
    pub total: usize,
}

/// GET /api/countries - countries present in the snapshot, sorted by name
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let data = current_data(&state).await?;

    let mut countries: Vec<CountryEntry> = data
        .countries
        .values()
        .map(|country| CountryEntry {
            channel_count: data
                .channels_by_country
                .get(&country.code)
                .map(Vec::len)
                .unwrap_or(0),
            country: country.clone(),
        })
        .collect();
    countries.sort_by(|a, b| a.country.name.cmp(&b.country.name));

    let total = countries.len();

    Ok(Json(CountriesResponse { countries, total }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    pub id: String,
    pub channel_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryEntry>,
    pub total: usize,
}

/// GET /api/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let data = current_data(&state).await?;

    let categories: Vec<CategoryEntry> = data
        .categories
        .iter()
        .map(|category| CategoryEntry {
            id: category.clone(),
            channel_count: data
                .channels_by_category
                .get(category)
                .map(Vec::len)
                .unwrap_or(0),
        })
        .collect();

    let total = categories.len();

    Ok(Json(CategoriesResponse { categories, total }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    #[serde(flatten)]
    pub language: Language,
    pub channel_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageEntry>,
    pub total: usize,
}

/// GET /api/languages - languages present in the snapshot, sorted by code
pub async fn list_languages(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let data = current_data(&state).await?;

    let mut languages: Vec<LanguageEntry> = data
        .languages
        .values()
        .map(|language| LanguageEntry {
            channel_count: data
                .channels_by_language
                .get(&language.code)
                .map(Vec::len)
                .unwrap_or(0),
            language: language.clone(),
        })
        .collect();
    languages.sort_by(|a, b| a.language.code.cmp(&b.language.code));

    let total = languages.len();

    Ok(Json(LanguagesResponse { languages, total }))
}
