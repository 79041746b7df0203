//! Data source selection
//!
//! The three source variants are a tagged union: the JSON API and official
//! playlist carry no extra state, while a custom playlist carries its URL.

use serde::{Deserialize, Serialize};

/// Where channel and stream data is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DataSource {
    /// Multi-endpoint JSON API with rich metadata
    JsonApi,
    /// Single consolidated M3U playlist
    M3uPlaylist,
    /// User-supplied M3U playlist URL
    CustomM3u { url: String },
}

impl Default for DataSource {
    fn default() -> Self {
        Self::JsonApi
    }
}

impl DataSource {
    /// Display label, stamped into cache metadata
    pub fn label(&self) -> String {
        match self {
            DataSource::JsonApi => "JSON API (Recommended)".to_string(),
            DataSource::M3uPlaylist => "M3U Playlist (Official)".to_string(),
            DataSource::CustomM3u { .. } => "Custom M3U Playlist".to_string(),
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::JsonApi => write!(f, "json-api"),
            DataSource::M3uPlaylist => write!(f, "m3u-playlist"),
            DataSource::CustomM3u { .. } => write!(f, "custom-m3u"),
        }
    }
}
