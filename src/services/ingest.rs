//! Channel data ingestion
//!
//! Cache-aside orchestration of the pipeline: read the cache, else fetch
//! fresh and populate it, and on a fetch failure fall back to a second cache
//! read. The three steps are explicit so each branch is testable on its own.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::db::repository::{channels, metadata, streams};
use crate::models::{CacheMetadata, Channel, DataSource, NormalizedData, Stream};
use crate::services::fetcher::{stitch_logos, Fetcher};
use crate::services::normalizer::normalize;
use crate::AppState;

/// Bumped when the cached data shape changes (e.g. logos added)
pub const CACHE_VERSION: i32 = 2;

lazy_static! {
    static ref FETCH_TOTAL: IntCounter = register_int_counter!(
        "channelhub_fetch_total",
        "Fresh data fetch attempts"
    )
    .unwrap();
    static ref FETCH_ERRORS: IntCounter = register_int_counter!(
        "channelhub_fetch_errors_total",
        "Fresh data fetch failures"
    )
    .unwrap();
    static ref CACHE_HITS: IntCounter = register_int_counter!(
        "channelhub_cache_hits_total",
        "Channel data served from a valid cache"
    )
    .unwrap();
    static ref CACHE_FALLBACKS: IntCounter = register_int_counter!(
        "channelhub_cache_fallbacks_total",
        "Cache reads serving as fallback after a fetch error"
    )
    .unwrap();
}

/// Result of a data load, fresh or cached
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub data: Arc<NormalizedData>,
    pub from_cache: bool,
    pub cache_date: Option<chrono::DateTime<Utc>>,
    /// Non-fatal annotation, e.g. stale-fallback after a network error
    pub notice: Option<String>,
}

/// The fetch/parse/normalize/cache pipeline behind a single entry point
pub struct ChannelDataService {
    pool: SqlitePool,
    fetcher: Fetcher,
    cache_ttl_ms: i64,
}

impl ChannelDataService {
    pub fn new(pool: SqlitePool, fetcher: Fetcher, cache_ttl_ms: i64) -> Self {
        Self {
            pool,
            fetcher,
            cache_ttl_ms,
        }
    }

    /// Load channel data: cache first (unless forced), then fresh fetch,
    /// then cache again as stale fallback. Fails only when both the fetch
    /// and the fallback read come up empty.
    pub async fn fetch_channel_data(
        &self,
        source: &DataSource,
        force_refresh: bool,
    ) -> Result<FetchOutcome> {
        if !force_refresh {
            if let Some(cached) = self.load_from_cache().await? {
                CACHE_HITS.inc();
                return Ok(cached);
            }
        }

        info!("Fetching fresh data from {}", source);
        FETCH_TOTAL.inc();

        match self.fetch_and_store(source).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                FETCH_ERRORS.inc();
                error!("Error fetching channel data: {err:#}");

                match self.load_from_cache().await? {
                    Some(mut cached) => {
                        CACHE_FALLBACKS.inc();
                        cached.notice = Some("Using cached data due to network error".to_string());
                        Ok(cached)
                    }
                    None => Err(err).context("Failed to load data and no cache available"),
                }
            }
        }
    }

    /// Fresh fetch, persisted to cache, then normalized
    async fn fetch_and_store(&self, source: &DataSource) -> Result<FetchOutcome> {
        let (channel_list, stream_list) = self.fetcher.fetch(source).await?;
        info!(
            "Fetched {} channels and {} streams from {}",
            channel_list.len(),
            stream_list.len(),
            source
        );

        self.save_to_cache(&channel_list, &stream_list, source).await?;

        let data = normalize(channel_list, stream_list);

        Ok(FetchOutcome {
            data: Arc::new(data),
            from_cache: false,
            cache_date: None,
            notice: None,
        })
    }

    /// Read the cached snapshot. `None` means "no usable cache": absent,
    /// version-outdated or expired metadata, or no cached channels.
    pub async fn load_from_cache(&self) -> Result<Option<FetchOutcome>> {
        let Some(meta) = metadata::get(&self.pool).await? else {
            return Ok(None);
        };

        if meta.version < CACHE_VERSION {
            info!("Cache version outdated, forcing refresh");
            return Ok(None);
        }

        if meta.is_expired(Utc::now().timestamp_millis()) {
            info!("Cache expired");
            return Ok(None);
        }

        let rows = channels::get_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        let mut channel_list: Vec<Channel> = rows.into_iter().map(Into::into).collect();

        // Older snapshots may predate the logos feed; backfill in place.
        // Best effort: a failed refetch never fails the cache read.
        let missing_logos = channel_list
            .iter()
            .any(|c| c.logo.as_deref().map_or(true, |l| l.is_empty()));
        if missing_logos {
            match self.fetcher.fetch_logo_map().await {
                Ok(logo_map) => {
                    stitch_logos(&mut channel_list, &logo_map);
                    if let Err(e) = channels::upsert_many(&self.pool, &channel_list).await {
                        warn!("Failed to persist backfilled logos: {}", e);
                    }
                }
                Err(e) => debug!("Logo backfill skipped: {}", e),
            }
        }

        let stream_list = streams::get_all(&self.pool).await?;
        info!(
            "Loaded {} channels and {} streams from cache",
            channel_list.len(),
            stream_list.len()
        );

        let cache_date = Utc.timestamp_millis_opt(meta.last_updated).single();
        let data = normalize(channel_list, stream_list);

        Ok(Some(FetchOutcome {
            data: Arc::new(data),
            from_cache: true,
            cache_date,
            notice: None,
        }))
    }

    /// Persist a fresh snapshot: upsert channels, replace per-channel stream
    /// lists, then stamp new metadata
    async fn save_to_cache(
        &self,
        channel_list: &[Channel],
        stream_list: &[Stream],
        source: &DataSource,
    ) -> Result<()> {
        channels::upsert_many(&self.pool, channel_list)
            .await
            .context("Failed to cache channels")?;

        let mut by_channel: HashMap<String, Vec<Stream>> = HashMap::new();
        for stream in stream_list {
            let Some(channel_id) = &stream.channel else {
                continue;
            };
            by_channel
                .entry(channel_id.clone())
                .or_default()
                .push(stream.clone());
        }
        streams::replace_many(&self.pool, &by_channel)
            .await
            .context("Failed to cache streams")?;

        let meta = CacheMetadata {
            version: CACHE_VERSION,
            last_updated: Utc::now().timestamp_millis(),
            data_source: source.label(),
            ttl: self.cache_ttl_ms,
        };
        metadata::save(&self.pool, &meta)
            .await
            .context("Failed to write cache metadata")?;

        info!("Data cached successfully");

        Ok(())
    }
}

/// Run a refresh in the background against the currently selected source
pub fn spawn_refresh(state: Arc<AppState>, force: bool) {
    tokio::spawn(async move {
        refresh_data(state, force).await;
    });
}

/// Fetch for the current source and apply the result to the state store.
/// A result for a source the user has moved away from is discarded.
pub async fn refresh_data(state: Arc<AppState>, force: bool) {
    let source = state.state.begin_loading().await;

    match state.data_service.fetch_channel_data(&source, force).await {
        Ok(outcome) => {
            if !state.state.apply_result(&source, outcome).await {
                info!("Discarding superseded fetch result for {}", source);
            }
        }
        Err(e) => {
            error!("Channel data load failed: {e:#}");
            state.state.apply_error(&source, &format!("{e:#}")).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::pool::test_pool;
    use crate::db::repository::favorites;

    /// Service wired to unroutable endpoints: every fetch fails fast
    fn offline_service(pool: SqlitePool) -> ChannelDataService {
        let mut config = Config::from_env();
        config.fetch_timeout_ms = 1_000;
        config.json_api.channels_url = "http://127.0.0.1:9/channels.json".to_string();
        config.json_api.streams_url = "http://127.0.0.1:9/streams.json".to_string();
        config.json_api.categories_url = "http://127.0.0.1:9/categories.json".to_string();
        config.json_api.countries_url = "http://127.0.0.1:9/countries.json".to_string();
        config.json_api.languages_url = "http://127.0.0.1:9/languages.json".to_string();
        config.json_api.logos_url = "http://127.0.0.1:9/logos.json".to_string();
        config.m3u_playlist_url = "http://127.0.0.1:9/index.m3u".to_string();

        let fetcher = Fetcher::new(&config);
        ChannelDataService::new(pool, fetcher, 86_400_000)
    }

    fn channel(id: &str) -> Channel {
        Channel {
            id: id.to_string(),
            name: format!("Channel {id}"),
            network: None,
            country: "US".to_string(),
            languages: vec!["eng".to_string()],
            categories: vec!["news".to_string()],
            is_nsfw: false,
            launched: None,
            closed: None,
            website: None,
            // Logos present so the cache read skips the backfill refetch
            logo: Some(format!("http://logos/{id}.png")),
        }
    }

    fn stream(channel: &str, url: &str) -> Stream {
        Stream {
            channel: Some(channel.to_string()),
            url: url.to_string(),
            feed: None,
            title: None,
            quality: None,
            referrer: None,
            user_agent: None,
            status: None,
        }
    }

    async fn seed_cache(service: &ChannelDataService, pool: &SqlitePool, age_ms: i64, version: i32) {
        let channel_list = vec![channel("A.us"), channel("B.us")];
        let stream_list = vec![
            stream("A.us", "http://a/1.m3u8"),
            stream("A.us", "http://a/2.m3u8"),
        ];
        service
            .save_to_cache(&channel_list, &stream_list, &DataSource::JsonApi)
            .await
            .unwrap();

        // Rewrite the envelope with the wanted age and version
        let meta = CacheMetadata {
            version,
            last_updated: Utc::now().timestamp_millis() - age_ms,
            data_source: "JSON API (Recommended)".to_string(),
            ttl: 86_400_000,
        };
        metadata::save(pool, &meta).await.unwrap();
    }

    #[test]
    fn test_ttl_boundary_age_equal_is_valid() {
        let meta = CacheMetadata {
            version: CACHE_VERSION,
            last_updated: 1_000_000,
            data_source: "x".to_string(),
            ttl: 500,
        };

        // age == ttl is still valid; only age > ttl expires
        assert!(!meta.is_expired(1_000_500));
        assert!(meta.is_expired(1_000_501));
    }

    #[tokio::test]
    async fn test_load_from_cache_empty_store_is_none() {
        let pool = test_pool().await;
        let service = offline_service(pool);

        assert!(service.load_from_cache().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let pool = test_pool().await;
        let service = offline_service(pool.clone());

        seed_cache(&service, &pool, 0, CACHE_VERSION).await;

        let outcome = service.load_from_cache().await.unwrap().unwrap();
        assert!(outcome.from_cache);
        assert!(outcome.cache_date.is_some());
        assert_eq!(outcome.data.channels.len(), 2);
        assert_eq!(outcome.data.stream_count("A.us"), 2);
        // Stream order preserved from the source list
        assert_eq!(outcome.data.streams_by_channel["A.us"][0].url, "http://a/1.m3u8");
    }

    #[tokio::test]
    async fn test_outdated_version_and_expired_age_disqualify() {
        let pool = test_pool().await;
        let service = offline_service(pool.clone());

        // 25h old, version 1, current version 2: both checks disqualify
        seed_cache(&service, &pool, 25 * 60 * 60 * 1000, 1).await;
        assert!(service.load_from_cache().await.unwrap().is_none());

        // Fix version, still expired
        seed_cache(&service, &pool, 25 * 60 * 60 * 1000, CACHE_VERSION).await;
        assert!(service.load_from_cache().await.unwrap().is_none());

        // Fresh metadata loads again
        seed_cache(&service, &pool, 60_000, CACHE_VERSION).await;
        assert!(service.load_from_cache().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_fetch_error_falls_back_to_cache_with_notice() {
        let pool = test_pool().await;
        let service = offline_service(pool.clone());

        seed_cache(&service, &pool, 60_000, CACHE_VERSION).await;

        // Force skips the first cache read; the fetch fails (unroutable),
        // the second cache read serves the data with a notice
        let outcome = service
            .fetch_channel_data(&DataSource::JsonApi, true)
            .await
            .unwrap();

        assert!(outcome.from_cache);
        assert_eq!(
            outcome.notice.as_deref(),
            Some("Using cached data due to network error")
        );
    }

    #[tokio::test]
    async fn test_fetch_error_without_cache_is_fatal() {
        let pool = test_pool().await;
        let service = offline_service(pool);

        let err = service
            .fetch_channel_data(&DataSource::JsonApi, false)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no cache available"));
    }

    #[tokio::test]
    async fn test_cache_wipe_leaves_user_stores_alone() {
        let pool = test_pool().await;
        let service = offline_service(pool.clone());

        seed_cache(&service, &pool, 0, CACHE_VERSION).await;
        favorites::add(&pool, "A.us", 1_000).await.unwrap();

        channels::clear(&pool).await.unwrap();
        streams::clear(&pool).await.unwrap();
        metadata::clear(&pool).await.unwrap();

        assert!(service.load_from_cache().await.unwrap().is_none());
        assert!(favorites::is_favorite(&pool, "A.us").await.unwrap());
    }
}
