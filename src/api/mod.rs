//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Airwave system:
//! - Blog post endpoints
//! - Podcast endpoints
//! - Tune tracker endpoints
//! - Program video endpoints (including the YouTube search proxy)
//! - Short link redirect and management
//! - Auth endpoints
//! - Admin endpoints (whitelist, users, stream configs, stats)
//! - The live stream relay and the object-storage media proxy
//! - Rate-limited public AI endpoints

pub mod admin;
pub mod ai;
pub mod auth;
pub mod links;
pub mod media;
pub mod middleware;
pub mod podcasts;
pub mod posts;
pub mod responses;
pub mod stream;
pub mod tunes;
pub mod videos;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

pub use middleware::{ApiError, AppState, RequestStats};

/// Build the JSON API router (everything except the byte-stream endpoints)
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (require the admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Staff routes (require auth; role allow-lists are enforced per handler)
    let staff_routes = Router::new()
        .route("/posts", post(posts::create_post))
        .route("/posts/all", get(posts::list_all_posts))
        .route("/posts/id/{id}", get(posts::get_post_by_id))
        .route("/posts/id/{id}", put(posts::update_post))
        .route("/posts/id/{id}", delete(posts::delete_post))
        .route("/podcasts", post(podcasts::create_podcast))
        .route("/podcasts/all", get(podcasts::list_all_podcasts))
        .route("/podcasts/id/{id}", put(podcasts::update_podcast))
        .route("/podcasts/id/{id}", delete(podcasts::delete_podcast))
        .route("/tunes", put(tunes::upsert_chart))
        .route("/tunes/predict", post(tunes::predict_chart))
        .route("/videos", post(videos::create_video))
        .route("/videos/search", get(videos::search_videos))
        .route("/videos/{id}", delete(videos::delete_video))
        .route("/links", get(links::list_links))
        .route("/links", post(links::create_link))
        .route("/links/{id}", delete(links::delete_link))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/posts", get(posts::list_posts))
        .route("/posts/{slug}", get(posts::get_post))
        .route("/podcasts", get(podcasts::list_podcasts))
        .route("/podcasts/{slug}", get(podcasts::get_podcast))
        .route("/tunes", get(tunes::get_chart))
        .route("/tunes/weeks", get(tunes::list_weeks))
        .route("/videos", get(videos::list_videos))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/ai/chat", post(ai::chat))
        .route("/ai/tldr", post(ai::tldr))
        .merge(admin_routes)
        .merge(staff_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS for the JSON API; cookie auth needs credentials
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    // The byte-stream endpoints manage their own (permissive) CORS headers
    // and must not go through the restrictive JSON-API layer
    let passthrough = Router::new()
        .route("/stream", get(stream::relay))
        .route("/media", get(media::serve_media));

    let api = build_api_router(state.clone()).layer(cors);

    Router::new()
        .nest("/api/v1", passthrough.merge(api))
        .route("/l/{slug}", get(links::follow_link))
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::{CacheConfig, StreamRelayConfig};
    use crate::db::repositories::{
        SqlxPodcastRepository, SqlxPostRepository, SqlxProgramVideoRepository,
        SqlxSessionRepository, SqlxShortLinkRepository, SqlxStreamConfigRepository,
        SqlxTuneRepository, SqlxUserRepository, SqlxWhitelistRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::services::{
        AiClient, PostService, PredictClient, SlidingWindowLimiter, UserService, YoutubeClient,
    };
    use crate::storage::FilesystemStore;
    use axum_test::TestServer;
    use bytes::Bytes;
    use std::sync::Arc;

    /// Build a full application over an in-memory database and a temp-dir
    /// object store. The relay and external clients point at an unroutable
    /// local port so connection failures are immediate.
    async fn test_server() -> (TestServer, tempfile::TempDir) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let media_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Arc::new(
            FilesystemStore::new(media_dir.path()).expect("Failed to create store"),
        );

        let cache = create_cache(&CacheConfig::default());
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let user_service = Arc::new(UserService::new(
            user_repo.clone(),
            SqlxSessionRepository::boxed(pool.clone()),
            SqlxWhitelistRepository::boxed(pool.clone()),
        ));
        let post_service = Arc::new(PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            cache,
        ));

        let state = AppState {
            user_service,
            post_service,
            user_repo,
            whitelist_repo: SqlxWhitelistRepository::boxed(pool.clone()),
            podcast_repo: SqlxPodcastRepository::boxed(pool.clone()),
            tune_repo: SqlxTuneRepository::boxed(pool.clone()),
            video_repo: SqlxProgramVideoRepository::boxed(pool.clone()),
            link_repo: SqlxShortLinkRepository::boxed(pool.clone()),
            stream_repo: SqlxStreamConfigRepository::boxed(pool.clone()),
            store,
            ai_client: Arc::new(AiClient::new("http://127.0.0.1:1/v1", "key", "model")),
            youtube_client: Arc::new(YoutubeClient::new("http://127.0.0.1:1/search", "key")),
            predict_client: Arc::new(PredictClient::new("")),
            chat_limiter: Arc::new(SlidingWindowLimiter::new(5, 60_000)),
            tldr_limiter: Arc::new(SlidingWindowLimiter::new(10, 60_000)),
            relay_http: reqwest::Client::new(),
            relay_config: StreamRelayConfig {
                upstream_url: "http://127.0.0.1:1/stream".to_string(),
                connect_timeout_secs: 1,
            },
            request_stats: Arc::new(RequestStats::new()),
        };

        let app = build_router(state, "http://localhost:3000");
        let server = TestServer::new(app).expect("Failed to start test server");
        (server, media_dir)
    }

    /// Register the bootstrap admin and return its bearer token.
    async fn register_admin(server: &TestServer) -> String {
        let response = server
            .post("/api/v1/auth/register")
            .json(&serde_json::json!({
                "email": "admin@station.edu",
                "name": "Admin",
                "password": "password123"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<serde_json::Value>()["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }

    #[tokio::test]
    async fn test_media_missing_key_is_400() {
        let (server, _dir) = test_server().await;

        let response = server.get("/api/v1/media").await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        response.assert_json(&serde_json::json!({ "error": "File key is missing" }));
    }

    #[tokio::test]
    async fn test_media_unknown_key_is_404() {
        let (server, _dir) = test_server().await;

        let response = server
            .get("/api/v1/media")
            .add_query_param("key", "podcasts/nope.mp3")
            .await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
        response.assert_json(&serde_json::json!({ "error": "File not found" }));
    }

    #[tokio::test]
    async fn test_media_streams_object_with_headers() {
        let (server, dir) = test_server().await;
        std::fs::create_dir_all(dir.path().join("podcasts")).unwrap();
        std::fs::write(dir.path().join("podcasts/a.mp3"), b"fake-mp3-bytes").unwrap();

        // The legacy key shape normalizes to podcasts/a.mp3
        let response = server
            .get("/api/v1/media")
            .add_query_param("key", "https://host/api/podcast/podcasts/a.mp3")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("content-type").to_str().unwrap(),
            "audio/mpeg"
        );
        assert_eq!(
            response.header("cache-control").to_str().unwrap(),
            "public, max-age=31536000, immutable"
        );
        assert_eq!(response.header("accept-ranges").to_str().unwrap(), "bytes");
        assert_eq!(response.as_bytes(), &Bytes::from_static(b"fake-mp3-bytes"));
    }

    #[tokio::test]
    async fn test_stream_upstream_error_is_502() {
        let (server, _dir) = test_server().await;

        let response = server.get("/api/v1/stream").await;
        response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
        response.assert_text("Upstream error");
    }

    #[tokio::test]
    async fn test_chat_is_rate_limited_per_client() {
        let (server, _dir) = test_server().await;

        // Quota is 5/min; the upstream is unreachable so allowed requests
        // come back 502, which still consumes quota slots
        for _ in 0..5 {
            let response = server
                .post("/api/v1/ai/chat")
                .add_header(
                    axum::http::HeaderName::from_static("x-forwarded-for"),
                    axum::http::HeaderValue::from_static("203.0.113.9"),
                )
                .json(&serde_json::json!({ "message": "hi" }))
                .await;
            response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
        }

        let response = server
            .post("/api/v1/ai/chat")
            .add_header(
                    axum::http::HeaderName::from_static("x-forwarded-for"),
                    axum::http::HeaderValue::from_static("203.0.113.9"),
                )
            .json(&serde_json::json!({ "message": "hi" }))
            .await;
        response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
        let body = response.json::<serde_json::Value>();
        assert!(body["error"]["message"].as_str().unwrap().contains("Too many"));

        // A different client is unaffected
        let response = server
            .post("/api/v1/ai/chat")
            .add_header(
                axum::http::HeaderName::from_static("x-forwarded-for"),
                axum::http::HeaderValue::from_static("198.51.100.7"),
            )
            .json(&serde_json::json!({ "message": "hi" }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_mutations_require_auth() {
        let (server, _dir) = test_server().await;

        let response = server
            .post("/api/v1/posts")
            .json(&serde_json::json!({
                "slug": "x", "title": "X", "content": "body"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_post_lifecycle_via_api() {
        let (server, _dir) = test_server().await;
        let token = register_admin(&server).await;

        // Create a published post
        let response = server
            .post("/api/v1/posts")
            .authorization_bearer(&token)
            .json(&serde_json::json!({
                "slug": "welcome-week",
                "title": "Welcome week",
                "content": "# Hello\n\nTune in.",
                "status": "published"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        // Publicly readable
        let response = server.get("/api/v1/posts/welcome-week").await;
        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert!(body["content_html"].as_str().unwrap().contains("<h1>Hello</h1>"));

        // Listed
        let response = server.get("/api/v1/posts").await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["total"], 1);
    }

    #[tokio::test]
    async fn test_roles_gate_mutations() {
        let (server, _dir) = test_server().await;
        let admin_token = register_admin(&server).await;

        // Whitelist and register a DJ (no roles assigned yet)
        server
            .post("/api/v1/admin/whitelist")
            .authorization_bearer(&admin_token)
            .json(&serde_json::json!({ "email": "dj@station.edu" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/v1/auth/register")
            .json(&serde_json::json!({
                "email": "dj@station.edu",
                "name": "DJ",
                "password": "password123"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let dj_token = response.json::<serde_json::Value>()["token"]
            .as_str()
            .unwrap()
            .to_string();
        let dj_id = response.json::<serde_json::Value>()["user"]["id"]
            .as_i64()
            .unwrap();

        // Without roles: cannot upsert the chart
        let chart = serde_json::json!({
            "week_of": "2026-08-03",
            "entries": [{ "position": 1, "title": "Song", "artist": "Band" }]
        });
        server
            .put("/api/v1/tunes")
            .authorization_bearer(&dj_token)
            .json(&chart)
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);

        // Admin grants the dj role (dash-delimited role string)
        server
            .put(&format!("/api/v1/admin/users/{}/roles", dj_id))
            .authorization_bearer(&admin_token)
            .json(&serde_json::json!({ "roles": "dj" }))
            .await
            .assert_status_ok();

        // Now the upsert succeeds
        server
            .put("/api/v1/tunes")
            .authorization_bearer(&dj_token)
            .json(&chart)
            .await
            .assert_status_ok();

        // But admin-only surface stays closed
        server
            .get("/api/v1/admin/users")
            .authorization_bearer(&dj_token)
            .await
            .assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_tune_chart_movement_bookkeeping() {
        let (server, _dir) = test_server().await;
        let token = register_admin(&server).await;

        server
            .put("/api/v1/tunes")
            .authorization_bearer(&token)
            .json(&serde_json::json!({
                "week_of": "2026-07-27",
                "entries": [
                    { "position": 1, "title": "Midnight Drive", "artist": "The Owls" },
                    { "position": 2, "title": "Paper Planes", "artist": "Quad" }
                ]
            }))
            .await
            .assert_status_ok();

        let response = server
            .put("/api/v1/tunes")
            .authorization_bearer(&token)
            .json(&serde_json::json!({
                "week_of": "2026-08-03",
                "entries": [
                    { "position": 1, "title": "Paper Planes", "artist": "Quad" },
                    { "position": 2, "title": "New Single", "artist": "Fresh Act" }
                ]
            }))
            .await;
        response.assert_status_ok();

        let body = response.json::<serde_json::Value>();
        let entries = body["entries"].as_array().unwrap();
        // Paper Planes moved 2 -> 1 and is on week 2
        assert_eq!(entries[0]["previous_position"], 2);
        assert_eq!(entries[0]["weeks_on_chart"], 2);
        // New entry has no previous position
        assert!(entries[1]["previous_position"].is_null());
        assert_eq!(entries[1]["weeks_on_chart"], 1);

        // Latest chart is served publicly
        let response = server.get("/api/v1/tunes").await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["week_of"], "2026-08-03");
    }

    #[tokio::test]
    async fn test_short_link_redirect_and_hits() {
        let (server, _dir) = test_server().await;
        let token = register_admin(&server).await;

        server
            .post("/api/v1/links")
            .authorization_bearer(&token)
            .json(&serde_json::json!({
                "slug": "gala",
                "target_url": "https://tickets.example.edu/gala"
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server.get("/l/gala").await;
        response.assert_status(axum::http::StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.header("location").to_str().unwrap(),
            "https://tickets.example.edu/gala"
        );

        let response = server.get("/l/unknown").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);

        let response = server
            .get("/api/v1/links")
            .authorization_bearer(&token)
            .await;
        let links = response.json::<serde_json::Value>();
        assert_eq!(links[0]["hits"], 1);
    }

    #[tokio::test]
    async fn test_stream_config_activation_switches_relay_target() {
        let (server, _dir) = test_server().await;
        let token = register_admin(&server).await;

        // Another unroutable target; the point is the relay reads the
        // active row (still 502, but via the configured URL)
        let response = server
            .post("/api/v1/admin/stream-configs")
            .authorization_bearer(&token)
            .json(&serde_json::json!({
                "name": "backup",
                "stream_url": "http://127.0.0.1:1/backup"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let id = response.json::<serde_json::Value>()["id"].as_i64().unwrap();

        server
            .post(&format!("/api/v1/admin/stream-configs/{}/activate", id))
            .authorization_bearer(&token)
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);

        let response = server
            .get("/api/v1/admin/stream-configs")
            .authorization_bearer(&token)
            .await;
        let configs = response.json::<serde_json::Value>();
        assert_eq!(configs[0]["is_active"], true);

        server
            .get("/api/v1/stream")
            .await
            .assert_status(axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let (server, _dir) = test_server().await;
        let token = register_admin(&server).await;

        server
            .get("/api/v1/auth/me")
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        server
            .post("/api/v1/auth/logout")
            .authorization_bearer(&token)
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);

        server
            .get("/api/v1/auth/me")
            .authorization_bearer(&token)
            .await
            .assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }
}
