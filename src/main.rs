//! Airwave - backend for a university radio station

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airwave::{
    api::{self, AppState, RequestStats},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxPodcastRepository, SqlxPostRepository, SqlxProgramVideoRepository,
            SqlxSessionRepository, SqlxShortLinkRepository, SqlxStreamConfigRepository,
            SqlxTuneRepository, SqlxUserRepository, SqlxWhitelistRepository,
        },
    },
    services::{
        rate_limiter::spawn_sweep_task, AiClient, PostService, PredictClient,
        SlidingWindowLimiter, UserService, YoutubeClient,
    },
    storage::create_store,
};

/// Rate-limit window for the public AI endpoints (1 minute)
const RATE_LIMIT_WINDOW_MS: i64 = 60_000;

/// Interval between rate-limiter sweeps
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Interval between expired-session purges
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airwave=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Airwave...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache and object storage
    let cache = create_cache(&config.cache);
    let store = create_store(&config.storage).await?;
    if let Err(e) = store.health_check().await {
        tracing::warn!("Storage health check failed: {}", e);
    }
    tracing::info!("Object storage initialized: {}", store.backend_name());

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let whitelist_repo = SqlxWhitelistRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let podcast_repo = SqlxPodcastRepository::boxed(pool.clone());
    let tune_repo = SqlxTuneRepository::boxed(pool.clone());
    let video_repo = SqlxProgramVideoRepository::boxed(pool.clone());
    let link_repo = SqlxShortLinkRepository::boxed(pool.clone());
    let stream_repo = SqlxStreamConfigRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        session_repo,
        whitelist_repo.clone(),
    ));
    let post_service = Arc::new(PostService::new(post_repo, cache));

    // External clients
    let ai_client = Arc::new(AiClient::new(
        config.ai.endpoint.clone(),
        config.ai.api_key.clone(),
        config.ai.model.clone(),
    ));
    let youtube_client = Arc::new(YoutubeClient::new(
        config.youtube.endpoint.clone(),
        config.youtube.api_key.clone(),
    ));
    let predict_client = Arc::new(PredictClient::new(config.predict.endpoint.clone()));

    // Rate limiters for the public AI endpoints
    let chat_limiter = Arc::new(SlidingWindowLimiter::new(
        config.ai.chat_quota,
        RATE_LIMIT_WINDOW_MS,
    ));
    let tldr_limiter = Arc::new(SlidingWindowLimiter::new(
        config.ai.tldr_quota,
        RATE_LIMIT_WINDOW_MS,
    ));

    // Outbound client for the stream relay. Only connecting is bounded;
    // the streamed body is endless by design.
    let relay_http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.stream.connect_timeout_secs))
        .build()
        .context("Failed to build relay HTTP client")?;

    let request_stats = Arc::new(RequestStats::new());

    let state = AppState {
        user_service: user_service.clone(),
        post_service,
        user_repo,
        whitelist_repo,
        podcast_repo,
        tune_repo,
        video_repo,
        link_repo,
        stream_repo,
        store,
        ai_client,
        youtube_client,
        predict_client,
        chat_limiter: chat_limiter.clone(),
        tldr_limiter: tldr_limiter.clone(),
        relay_http,
        relay_config: config.stream.clone(),
        request_stats,
    };

    // Sweep idle rate-limiter entries every minute
    let _sweeper = spawn_sweep_task(vec![chat_limiter, tldr_limiter], RATE_LIMIT_SWEEP_INTERVAL);

    // Purge expired sessions hourly
    {
        let user_service = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("Purged {} expired session(s)", n),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
