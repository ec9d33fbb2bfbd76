//! API middleware
//!
//! Contains middleware and shared plumbing for:
//! - Authentication (session token validation)
//! - Authorization (role-set checks against per-endpoint allow-lists)
//! - Request statistics
//! - Rate-limit client identification

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::StreamRelayConfig;
use crate::db::repositories::{
    PodcastRepository, ProgramVideoRepository, ShortLinkRepository, StreamConfigRepository,
    TuneRepository, UserRepository, WhitelistRepository,
};
use crate::models::User;
use crate::services::ai::AiClientError;
use crate::services::posts::PostServiceError;
use crate::services::user::UserServiceError;
use crate::services::{AiClient, PostService, PredictClient, SlidingWindowLimiter, UserService, YoutubeClient};
use crate::storage::ObjectStore;

/// Sentinel client identifier used when no forwarded IP is present
pub const UNKNOWN_CLIENT: &str = "unknown";

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    /// Total number of requests processed
    total_requests: AtomicU64,
    /// Total response time in microseconds (for calculating average)
    total_response_time_us: AtomicU64,
    /// Application start time
    start_time: Instant,
}

impl RequestStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    /// Get total request count
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Get average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub user_repo: Arc<dyn UserRepository>,
    pub whitelist_repo: Arc<dyn WhitelistRepository>,
    pub podcast_repo: Arc<dyn PodcastRepository>,
    pub tune_repo: Arc<dyn TuneRepository>,
    pub video_repo: Arc<dyn ProgramVideoRepository>,
    pub link_repo: Arc<dyn ShortLinkRepository>,
    pub stream_repo: Arc<dyn StreamConfigRepository>,
    pub store: Arc<dyn ObjectStore>,
    pub ai_client: Arc<AiClient>,
    pub youtube_client: Arc<YoutubeClient>,
    pub predict_client: Arc<PredictClient>,
    pub chat_limiter: Arc<SlidingWindowLimiter>,
    pub tldr_limiter: Arc<SlidingWindowLimiter>,
    /// Outbound client for the stream relay (no total timeout, bodies are endless)
    pub relay_http: reqwest::Client,
    pub relay_config: StreamRelayConfig,
    pub request_stats: Arc<RequestStats>,
}

/// Authenticated user extracted from request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMITED", message)
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new("CONNECTION_FAILED", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            "CONNECTION_FAILED" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::NotWhitelisted(email) => {
                ApiError::forbidden(format!("Email is not whitelisted: {}", email))
            }
            UserServiceError::UserExists(msg) => ApiError::new("CONFLICT", msg),
            UserServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<PostServiceError> for ApiError {
    fn from(e: PostServiceError) -> Self {
        match e {
            PostServiceError::NotFound(msg) => ApiError::not_found(msg),
            PostServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PostServiceError::SlugExists(msg) => ApiError::new("CONFLICT", msg),
            PostServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<AiClientError> for ApiError {
    fn from(e: AiClientError) -> Self {
        match e {
            AiClientError::ConnectionFailed(msg) => ApiError::connection_failed(msg),
            AiClientError::BadResponse(msg) => ApiError::internal_error(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::internal_error(e.to_string())
    }
}

/// Extract session token from request
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(|e| ApiError::internal_error(format!("Session validation failed: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin role required"));
    }

    Ok(next.run(request).await)
}

/// Check the user's role set against an endpoint allow-list.
///
/// Used inside handlers where route groups share an auth layer but differ
/// in which roles may mutate.
pub fn require_roles(user: &User, allowed: &[&str]) -> Result<(), ApiError> {
    if user.has_any_role(allowed) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Requires one of the roles: {}",
            allowed.join(", ")
        )))
    }
}

/// Request statistics middleware
///
/// Records request count and response time for performance monitoring.
/// Uses atomic operations for minimal overhead.
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_us = start.elapsed().as_micros() as u64;
    state.request_stats.record(duration_us);

    response
}

/// Derive the rate-limit client identifier from the forwarded-IP header.
///
/// The first value of `x-forwarded-for` is used as-is; requests without
/// the header share the `"unknown"` sentinel bucket. The header is
/// client-supplied input, so the identifier is spoofable; the limiter is
/// an abuse brake, not a security boundary.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn create_request_with_auth(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn create_request_with_cookie(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::COOKIE, format!("session={}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let request = create_request_with_auth("test-token-123");
        assert_eq!(
            extract_session_token(&request),
            Some("test-token-123".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let request = create_request_with_cookie("test-token-456");
        assert_eq!(
            extract_session_token(&request),
            Some("test-token-456".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "session=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(&request),
            Some("bearer-token".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_session_token(&request).is_none());
    }

    #[test]
    fn test_api_error_status_mapping() {
        assert_eq!(ApiError::unauthorized("x").error.code, "UNAUTHORIZED");
        assert_eq!(ApiError::forbidden("x").error.code, "FORBIDDEN");
        assert_eq!(ApiError::rate_limited("x").error.code, "RATE_LIMITED");
        assert_eq!(
            ApiError::connection_failed("x").error.code,
            "CONNECTION_FAILED"
        );
    }

    #[test]
    fn test_client_key_from_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers), "203.0.113.9");
    }

    #[test]
    fn test_client_key_defaults_to_sentinel() {
        let headers = HeaderMap::new();
        assert_eq!(client_key(&headers), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_client_key_empty_header_is_sentinel() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());
        assert_eq!(client_key(&headers), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_require_roles() {
        let user = User::new(
            "dj@station.edu".to_string(),
            "DJ".to_string(),
            "hash".to_string(),
            "dj-editor".parse().unwrap(),
        );

        assert!(require_roles(&user, &["admin", "dj"]).is_ok());
        assert!(require_roles(&user, &["admin"]).is_err());
    }

    #[test]
    fn test_request_stats() {
        let stats = RequestStats::new();
        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.avg_response_time_us(), 0.0);

        stats.record(100);
        stats.record(300);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.avg_response_time_us(), 200.0);
    }
}
