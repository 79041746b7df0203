//! Database row types for SQLite
//!
//! These types map directly to table rows and convert to the API types in
//! models/channel.rs. List-valued channel fields (languages, categories) and
//! per-channel stream lists are stored as JSON text.

use sqlx::FromRow;

use crate::models::{CacheMetadata, Channel, Favorite, RecentlyPlayed, Stream};

/// Channel row from the channels table
#[derive(Debug, Clone, FromRow)]
pub struct ChannelRow {
    pub id: String,
    pub name: String,
    pub network: Option<String>,
    pub country: String,
    pub languages: String,
    pub categories: String,
    pub is_nsfw: bool,
    pub launched: Option<String>,
    pub closed: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
}

impl From<ChannelRow> for Channel {
    fn from(row: ChannelRow) -> Self {
        Channel {
            id: row.id,
            name: row.name,
            network: row.network,
            country: row.country,
            languages: parse_json_list(&row.languages),
            categories: parse_json_list(&row.categories),
            is_nsfw: row.is_nsfw,
            launched: row.launched,
            closed: row.closed,
            website: row.website,
            logo: row.logo,
        }
    }
}

/// Stream-list row from the channel_streams table: one row per channel,
/// holding that channel's full stream list
#[derive(Debug, Clone, FromRow)]
pub struct StreamSetRow {
    pub channel_id: String,
    pub streams: String,
}

impl StreamSetRow {
    /// Decode the JSON stream list; a corrupt row yields an empty list
    pub fn into_streams(self) -> Vec<Stream> {
        match serde_json::from_str(&self.streams) {
            Ok(streams) => streams,
            Err(e) => {
                tracing::warn!("Corrupt stream list for channel {}: {}", self.channel_id, e);
                Vec::new()
            }
        }
    }
}

/// Favorite row from the favorites table
#[derive(Debug, Clone, FromRow)]
pub struct FavoriteRow {
    pub channel_id: String,
    pub added_at: i64,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Favorite {
            channel_id: row.channel_id,
            added_at: row.added_at,
        }
    }
}

/// Recently-played row
#[derive(Debug, Clone, FromRow)]
pub struct RecentlyPlayedRow {
    pub channel_id: String,
    pub stream_url: String,
    pub played_at: i64,
    pub duration_secs: Option<i64>,
}

impl From<RecentlyPlayedRow> for RecentlyPlayed {
    fn from(row: RecentlyPlayedRow) -> Self {
        RecentlyPlayed {
            channel_id: row.channel_id,
            stream_url: row.stream_url,
            played_at: row.played_at,
            duration: row.duration_secs,
        }
    }
}

/// Cache metadata row (singleton under the 'cache-info' key)
#[derive(Debug, Clone, FromRow)]
pub struct CacheMetadataRow {
    pub version: i64,
    pub last_updated: i64,
    pub data_source: String,
    pub ttl_ms: i64,
}

impl From<CacheMetadataRow> for CacheMetadata {
    fn from(row: CacheMetadataRow) -> Self {
        CacheMetadata {
            version: row.version as i32,
            last_updated: row.last_updated,
            data_source: row.data_source,
            ttl: row.ttl_ms,
        }
    }
}

/// Serialize a string list for storage; never fails for string data
pub fn to_json_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn parse_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_row_list_fields_round_trip() {
        let row = ChannelRow {
            id: "Example.us".to_string(),
            name: "Example".to_string(),
            network: None,
            country: "US".to_string(),
            languages: to_json_list(&["eng".to_string()]),
            categories: to_json_list(&["news".to_string(), "general".to_string()]),
            is_nsfw: false,
            launched: None,
            closed: None,
            website: None,
            logo: None,
        };

        let channel: Channel = row.into();
        assert_eq!(channel.languages, vec!["eng"]);
        assert_eq!(channel.categories, vec!["news", "general"]);
    }

    #[test]
    fn test_corrupt_stream_row_yields_empty_list() {
        let row = StreamSetRow {
            channel_id: "X".to_string(),
            streams: "not json".to_string(),
        };
        assert!(row.into_streams().is_empty());
    }
}
