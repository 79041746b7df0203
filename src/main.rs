mod config;
mod db;
mod models;
mod routes;
mod services;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::services::{
    cleanup::start_maintenance_task,
    fetcher::Fetcher,
    ingest::{self, ChannelDataService},
    state::StateStore,
};
use sqlx::SqlitePool;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub pool: SqlitePool,
    pub data_service: ChannelDataService,
    pub state: StateStore,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "channelhub_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting ChannelHub Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.node_env);

    // Initialize SQLite
    let pool = create_pool(&config).await?;
    tracing::info!("SQLite connected: {}", config.database_url);

    run_migrations(&pool).await?;

    // Initialize the data pipeline
    let fetcher = Fetcher::new(&config);
    let data_service = ChannelDataService::new(pool.clone(), fetcher, config.cache_ttl_ms);
    tracing::info!("Channel data pipeline initialized");

    // Resume the data source the user last selected
    let settings = db::repository::settings::get(&pool).await?;
    let state_store = StateStore::new(settings.data_source.clone());
    tracing::info!("Data source: {}", settings.data_source);

    // Build application state
    let state = Arc::new(AppState {
        config,
        pool,
        data_service,
        state: state_store,
        start_time: Instant::now(),
    });

    // Initial data load (cache first, then network)
    ingest::spawn_refresh(state.clone(), false);

    // Log state transitions from the observable store
    let watcher = state.clone();
    tokio::spawn(async move {
        let mut changes = watcher.state.subscribe();
        while changes.changed().await.is_ok() {
            let snapshot = watcher.state.snapshot().await;
            tracing::debug!(
                loading = snapshot.loading,
                has_data = snapshot.data.is_some(),
                error = snapshot.error.as_deref().unwrap_or(""),
                "State changed"
            );
        }
    });

    // Start maintenance task (runs in background)
    tokio::spawn(start_maintenance_task(state.clone()));
    tracing::info!("Maintenance task started");

    // Build router
    let app = Router::new()
        // Health endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/ready", get(routes::health::ready))
        .route("/live", get(routes::health::live))
        // Data pipeline endpoints
        .route("/api/data/status", get(routes::data::get_status))
        .route("/api/data/refresh", post(routes::data::refresh))
        .route("/api/data/source", put(routes::data::set_source))
        // Channel browsing endpoints
        .route("/api/channels", get(routes::channels::list_channels))
        .route("/api/channels/:id", get(routes::channels::get_channel))
        .route(
            "/api/channels/:id/streams",
            get(routes::channels::get_channel_streams),
        )
        .route("/api/countries", get(routes::channels::list_countries))
        .route("/api/categories", get(routes::channels::list_categories))
        .route("/api/languages", get(routes::channels::list_languages))
        // Favorites endpoints
        .route(
            "/api/favorites",
            get(routes::favorites::list_favorites).post(routes::favorites::add_favorite),
        )
        .route(
            "/api/favorites/:channel_id",
            delete(routes::favorites::remove_favorite),
        )
        // Recently-played endpoints
        .route(
            "/api/recently-played",
            get(routes::recently_played::list_recently_played)
                .post(routes::recently_played::record_play),
        )
        // Settings endpoints
        .route(
            "/api/settings",
            get(routes::settings::get_settings).put(routes::settings::update_settings),
        )
        // Admin endpoints (protected by ADMIN_KEY)
        .route("/api/admin/cache", delete(routes::admin::clear_cache))
        .route("/api/admin/all", delete(routes::admin::clear_all))
        .route("/api/admin/stats", get(routes::admin::get_db_stats))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
