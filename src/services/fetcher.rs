//! Channel data fetcher
//!
//! Obtains raw `(channels, streams)` for a selected source: the
//! multi-endpoint JSON API (six concurrent requests, two load-bearing) or an
//! M3U playlist (official or user-supplied). No retries happen here; the
//! shared client's timeout is the only transport policy. Cache fallback on
//! failure is the caller's job.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::config::{Config, JsonApiEndpoints};
use crate::models::{Channel, DataSource, Stream};
use crate::services::m3u_parser;

/// Unrecoverable fetch failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },
    #[error("failed to decode {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid playlist URL: {0}")]
    InvalidUrl(String),
    #[error("playlist too large: {size_mb:.1}MB (limit {limit_mb}MB)")]
    PlaylistTooLarge { size_mb: f64, limit_mb: usize },
}

/// Entry in the logos feed
#[derive(Debug, Deserialize)]
struct LogoEntry {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// HTTP fetcher over the configured sources
pub struct Fetcher {
    client: Client,
    endpoints: JsonApiEndpoints,
    m3u_playlist_url: String,
    max_m3u_size_mb: usize,
}

impl Fetcher {
    /// Create a fetcher with a shared HTTP client
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .gzip(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoints: config.json_api.clone(),
            m3u_playlist_url: config.m3u_playlist_url.clone(),
            max_m3u_size_mb: config.max_m3u_size_mb,
        }
    }

    /// Fetch raw channel and stream lists for the selected source
    pub async fn fetch(&self, source: &DataSource) -> Result<(Vec<Channel>, Vec<Stream>), FetchError> {
        match source {
            DataSource::JsonApi => self.fetch_json_api().await,
            DataSource::M3uPlaylist => self.fetch_m3u(&self.m3u_playlist_url).await,
            DataSource::CustomM3u { url } => {
                validate_playlist_url(url)?;
                self.fetch_m3u(url).await
            }
        }
    }

    /// Six concurrent endpoint requests. channels + streams are load-bearing;
    /// categories/countries/languages/logos failures are ignored per-request.
    async fn fetch_json_api(&self) -> Result<(Vec<Channel>, Vec<Stream>), FetchError> {
        let e = &self.endpoints;

        let (channels_res, streams_res, categories_res, countries_res, languages_res, logos_res) =
            futures::join!(
                self.client.get(&e.channels_url).send(),
                self.client.get(&e.streams_url).send(),
                self.client.get(&e.categories_url).send(),
                self.client.get(&e.countries_url).send(),
                self.client.get(&e.languages_url).send(),
                self.client.get(&e.logos_url).send(),
            );

        let channels_resp = require_success("channels", channels_res)?;
        let streams_resp = require_success("streams", streams_res)?;

        let mut channels: Vec<Channel> =
            channels_resp
                .json()
                .await
                .map_err(|source| FetchError::Decode {
                    endpoint: "channels",
                    source,
                })?;
        let streams: Vec<Stream> =
            streams_resp
                .json()
                .await
                .map_err(|source| FetchError::Decode {
                    endpoint: "streams",
                    source,
                })?;

        log_supplementary("categories", categories_res).await;
        log_supplementary("countries", countries_res).await;
        log_supplementary("languages", languages_res).await;

        // Stamp logo URLs onto channels from the logos feed
        if let Some(logo_map) = logo_map_from(logos_res).await {
            debug!("Loaded {} logos", logo_map.len());
            stitch_logos(&mut channels, &logo_map);
        }

        Ok((channels, streams))
    }

    /// One request for the playlist text, streamed with a running size cap
    async fn fetch_m3u(&self, url: &str) -> Result<(Vec<Channel>, Vec<Stream>), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                endpoint: "playlist",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: "playlist",
                status,
            });
        }

        let max_bytes = (self.max_m3u_size_mb as u64) * 1024 * 1024;
        if let Some(len) = response.content_length() {
            if len > max_bytes {
                return Err(FetchError::PlaylistTooLarge {
                    size_mb: len as f64 / 1024.0 / 1024.0,
                    limit_mb: self.max_m3u_size_mb,
                });
            }
        }

        let mut body: Vec<u8> = Vec::new();
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|source| FetchError::Transport {
                endpoint: "playlist",
                source,
            })?;

            if (body.len() + chunk.len()) as u64 > max_bytes {
                return Err(FetchError::PlaylistTooLarge {
                    size_mb: (body.len() + chunk.len()) as f64 / 1024.0 / 1024.0,
                    limit_mb: self.max_m3u_size_mb,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let content = String::from_utf8_lossy(&body);
        let entries = m3u_parser::parse_m3u(&content);

        Ok(m3u_parser::entries_to_channels_and_streams(&entries))
    }

    /// Fetch the logos feed into a channel-id -> URL map.
    /// Used by the cache read path to backfill missing logos.
    pub async fn fetch_logo_map(&self) -> Result<HashMap<String, String>, FetchError> {
        let response = require_success(
            "logos",
            self.client.get(&self.endpoints.logos_url).send().await,
        )?;

        let entries: Vec<LogoEntry> =
            response.json().await.map_err(|source| FetchError::Decode {
                endpoint: "logos",
                source,
            })?;

        Ok(build_logo_map(entries))
    }
}

/// Check the custom playlist URL before fetching it
fn validate_playlist_url(raw: &str) -> Result<(), FetchError> {
    match url::Url::parse(raw) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(parsed) => Err(FetchError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        ))),
        Err(e) => Err(FetchError::InvalidUrl(e.to_string())),
    }
}

fn require_success(
    endpoint: &'static str,
    result: Result<Response, reqwest::Error>,
) -> Result<Response, FetchError> {
    let response = result.map_err(|source| FetchError::Transport { endpoint, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status { endpoint, status });
    }

    Ok(response)
}

/// Supplementary feed: parsed and counted on success, ignored on any failure
async fn log_supplementary(name: &'static str, result: Result<Response, reqwest::Error>) {
    match result {
        Ok(response) if response.status().is_success() => {
            match response.json::<Vec<serde_json::Value>>().await {
                Ok(records) => debug!("Loaded {} {}", records.len(), name),
                Err(e) => debug!("Ignoring unreadable {} feed: {}", name, e),
            }
        }
        Ok(response) => debug!("Ignoring {} feed: HTTP {}", name, response.status()),
        Err(e) => debug!("Ignoring {} feed: {}", name, e),
    }
}

/// Logos feed response to map; failures yield None and are ignored
async fn logo_map_from(
    result: Result<Response, reqwest::Error>,
) -> Option<HashMap<String, String>> {
    match result {
        Ok(response) if response.status().is_success() => {
            match response.json::<Vec<LogoEntry>>().await {
                Ok(entries) => Some(build_logo_map(entries)),
                Err(e) => {
                    debug!("Ignoring unreadable logos feed: {}", e);
                    None
                }
            }
        }
        Ok(response) => {
            debug!("Ignoring logos feed: HTTP {}", response.status());
            None
        }
        Err(e) => {
            debug!("Ignoring logos feed: {}", e);
            None
        }
    }
}

/// First occurrence wins on duplicate channel ids; blank entries skipped
fn build_logo_map(entries: Vec<LogoEntry>) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for entry in entries {
        if let (Some(channel), Some(url)) = (entry.channel, entry.url) {
            if !channel.is_empty() && !url.is_empty() {
                map.entry(channel).or_insert(url);
            }
        }
    }

    map
}

/// A channel keeps its own non-empty logo, else takes the map entry
pub fn stitch_logos(channels: &mut [Channel], logo_map: &HashMap<String, String>) {
    for channel in channels {
        let missing = channel.logo.as_deref().map_or(true, |l| l.is_empty());
        if missing {
            channel.logo = logo_map.get(&channel.id).cloned();
        }
    }
}
