use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::models::source::DataSource;

/// Stream health as reported by the upstream dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Online,
    Error,
    Timeout,
    Offline,
}

/// A logical broadcast entity, independent of any specific stream URL.
///
/// Field names are snake_case on the wire to match the upstream
/// `channels.json` payload, so the same type deserializes the feed and
/// serializes API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub is_nsfw: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launched: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// A playable URL endpoint. `channel` is a nullable foreign key; a stream
/// without one is orphaned and unreachable through the normalized view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    #[serde(default)]
    pub channel: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StreamStatus>,
}

/// Country display metadata, created on first encounter during normalization
#[derive(Debug, Clone, Serialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub flag: String,
}

/// Language display metadata
#[derive(Debug, Clone, Serialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

/// Derived, read-only snapshot built from a `(channels, streams)` pair.
///
/// Rebuilt wholesale on every successful fetch or cache load, never mutated
/// in place. `channel_order` records first-insertion order so that filtered
/// listings are stable across identical inputs.
#[derive(Debug, Default)]
pub struct NormalizedData {
    pub channels: HashMap<String, Channel>,
    pub channel_order: Vec<String>,
    pub streams_by_channel: HashMap<String, Vec<Stream>>,
    pub countries: HashMap<String, Country>,
    pub categories: BTreeSet<String>,
    pub languages: HashMap<String, Language>,
    pub channels_by_country: HashMap<String, Vec<String>>,
    pub channels_by_category: HashMap<String, Vec<String>>,
    pub channels_by_language: HashMap<String, Vec<String>>,
    /// Epoch milliseconds of the normalize run
    pub last_updated: i64,
}

impl NormalizedData {
    /// Channels in first-insertion order
    pub fn channels_in_order(&self) -> impl Iterator<Item = &Channel> {
        self.channel_order
            .iter()
            .filter_map(|id| self.channels.get(id))
    }

    /// Number of streams reachable for a channel (0 for unknown ids)
    pub fn stream_count(&self, channel_id: &str) -> usize {
        self.streams_by_channel
            .get(channel_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

/// Envelope describing a cached snapshot. Sole gate for cache validity:
/// valid iff `version >= CACHE_VERSION` and `age <= ttl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub version: i32,
    /// Epoch milliseconds of the last successful fetch
    pub last_updated: i64,
    /// Display label of the source the snapshot came from
    pub data_source: String,
    /// Time-to-live in milliseconds
    pub ttl: i64,
}

impl CacheMetadata {
    /// Expired iff age strictly exceeds the TTL (age == ttl is still valid)
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.last_updated > self.ttl
    }
}

/// A favorited channel. Independent of the cache TTL; never expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub channel_id: String,
    /// Epoch milliseconds
    pub added_at: i64,
}

/// Playback history entry, one per channel (latest play wins)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyPlayed {
    pub channel_id: String,
    pub stream_url: String,
    /// Epoch milliseconds
    pub played_at: i64,
    /// Playback duration in seconds, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// Persisted user settings (singleton row in the settings store)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub data_source: DataSource,
    #[serde(default)]
    pub custom_m3u_url: String,
    #[serde(default = "default_true")]
    pub hide_nsfw: bool,
    #[serde(default)]
    pub hide_http_streams: bool,
    #[serde(default)]
    pub autoplay: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Hours between automatic data refreshes
    #[serde(default = "default_refresh_interval")]
    pub data_refresh_interval: u32,
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    0.8
}

fn default_quality() -> String {
    "auto".to_string()
}

fn default_refresh_interval() -> u32 {
    24
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_source: DataSource::default(),
            custom_m3u_url: String::new(),
            hide_nsfw: true,
            hide_http_streams: false,
            autoplay: false,
            volume: 0.8,
            quality: "auto".to_string(),
            data_refresh_interval: 24,
        }
    }
}

/// Partial settings update (PUT /api/settings merges into the current value)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub data_source: Option<DataSource>,
    pub custom_m3u_url: Option<String>,
    pub hide_nsfw: Option<bool>,
    pub hide_http_streams: Option<bool>,
    pub autoplay: Option<bool>,
    pub volume: Option<f32>,
    pub quality: Option<String>,
    pub data_refresh_interval: Option<u32>,
}

impl AppSettings {
    /// Merge a partial update into the current settings
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(v) = update.data_source {
            self.data_source = v;
        }
        if let Some(v) = update.custom_m3u_url {
            self.custom_m3u_url = v;
        }
        if let Some(v) = update.hide_nsfw {
            self.hide_nsfw = v;
        }
        if let Some(v) = update.hide_http_streams {
            self.hide_http_streams = v;
        }
        if let Some(v) = update.autoplay {
            self.autoplay = v;
        }
        if let Some(v) = update.volume {
            self.volume = v;
        }
        if let Some(v) = update.quality {
            self.quality = v;
        }
        if let Some(v) = update.data_refresh_interval {
            self.data_refresh_interval = v;
        }
    }
}

/// Stream-presence filter: all channels, only those with at least one
/// stream, or only those with none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamFilter {
    #[default]
    All,
    WithStreams,
    NoStreams,
}

/// Independent, AND-combined channel predicates. Every field is bypassable.
#[derive(Debug, Clone)]
pub struct ChannelFilters {
    pub query: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub stream_filter: StreamFilter,
    pub hide_nsfw: bool,
}

impl Default for ChannelFilters {
    fn default() -> Self {
        Self {
            query: None,
            country: None,
            category: None,
            language: None,
            stream_filter: StreamFilter::All,
            hide_nsfw: true,
        }
    }
}

/// Query parameters for the channel listing endpoint
#[derive(Debug, Deserialize)]
pub struct ChannelsQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub streams: Option<StreamFilter>,
    #[serde(default)]
    pub hide_nsfw: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    100
}

/// Paginated channel listing response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsResponse {
    pub channels: Vec<Channel>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}
