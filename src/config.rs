use std::env;

/// Endpoint URLs for the JSON API source. Six feeds: channels and streams
/// are load-bearing, the rest are supplementary.
#[derive(Debug, Clone)]
pub struct JsonApiEndpoints {
    pub channels_url: String,
    pub streams_url: String,
    pub categories_url: String,
    pub countries_url: String,
    pub languages_url: String,
    pub logos_url: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,

    // SQLite
    pub database_url: String,
    pub db_max_connections: u32,

    // Data sources
    pub json_api: JsonApiEndpoints,
    pub m3u_playlist_url: String,

    // Fetching
    pub fetch_timeout_ms: u64,
    pub max_m3u_size_mb: usize,
    pub user_agent: String,

    // Caching
    pub cache_ttl_ms: i64,

    // Maintenance
    pub maintenance_interval_secs: u64,
    pub max_recently_played: i64,

    // Listing
    pub max_channels_page: usize,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),
            node_env: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),

            // SQLite
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/channelhub.db?mode=rwc".to_string()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Data sources
            json_api: JsonApiEndpoints {
                channels_url: env::var("CHANNELS_URL").unwrap_or_else(|_| {
                    "https://iptv-org.github.io/api/channels.json".to_string()
                }),
                streams_url: env::var("STREAMS_URL")
                    .unwrap_or_else(|_| "https://iptv-org.github.io/api/streams.json".to_string()),
                categories_url: env::var("CATEGORIES_URL").unwrap_or_else(|_| {
                    "https://iptv-org.github.io/api/categories.json".to_string()
                }),
                countries_url: env::var("COUNTRIES_URL").unwrap_or_else(|_| {
                    "https://iptv-org.github.io/api/countries.json".to_string()
                }),
                languages_url: env::var("LANGUAGES_URL").unwrap_or_else(|_| {
                    "https://iptv-org.github.io/api/languages.json".to_string()
                }),
                logos_url: env::var("LOGOS_URL")
                    .unwrap_or_else(|_| "https://iptv-org.github.io/api/logos.json".to_string()),
            },
            m3u_playlist_url: env::var("M3U_PLAYLIST_URL")
                .unwrap_or_else(|_| "https://iptv-org.github.io/iptv/index.m3u".to_string()),

            // Fetching
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "120000".to_string())
                .parse()
                .unwrap_or(120_000), // 2 minutes

            max_m3u_size_mb: env::var("MAX_M3U_SIZE_MB")
                .unwrap_or_else(|_| "200".to_string())
                .parse()
                .unwrap_or(200),

            // Use VLC user agent to avoid IPTV server blocks
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "VLC/3.0.20 LibVLC/3.0.20".to_string()),

            // Caching
            cache_ttl_ms: env::var("CACHE_TTL_MS")
                .unwrap_or_else(|_| "86400000".to_string())
                .parse()
                .unwrap_or(86_400_000), // 24 hours

            // Maintenance
            maintenance_interval_secs: env::var("MAINTENANCE_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600), // hourly
            max_recently_played: env::var("MAX_RECENTLY_PLAYED")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),

            // Listing
            max_channels_page: env::var("MAX_CHANNELS_PAGE")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
