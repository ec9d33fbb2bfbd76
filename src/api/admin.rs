//! Admin API endpoints
//!
//! Everything here sits behind the `require_auth` + `require_admin`
//! layers: whitelist management, user role management, stream
//! configuration, and process stats.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::UserResponse;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{RoleSet, StreamConfig, UpdateStreamConfigInput, WhitelistedEmail};

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/whitelist", get(list_whitelist))
        .route("/whitelist", post(add_whitelist_email))
        .route("/whitelist/{email}", delete(remove_whitelist_email))
        .route("/users", get(list_users))
        .route("/users/{id}/roles", put(update_user_roles))
        .route("/stream-configs", get(list_stream_configs))
        .route("/stream-configs", post(create_stream_config))
        .route("/stream-configs/{id}", put(update_stream_config))
        .route("/stream-configs/{id}/activate", post(activate_stream_config))
        .route("/stream-configs/{id}", delete(delete_stream_config))
        .route("/stats", get(get_stats))
}

// ============================================================================
// Whitelist management
// ============================================================================

/// Request body for adding a whitelisted email
#[derive(Debug, Deserialize)]
pub struct AddWhitelistRequest {
    pub email: String,
    pub note: Option<String>,
}

/// GET /api/v1/admin/whitelist
async fn list_whitelist(
    State(state): State<AppState>,
) -> Result<Json<Vec<WhitelistedEmail>>, ApiError> {
    Ok(Json(state.whitelist_repo.list().await?))
}

/// POST /api/v1/admin/whitelist
async fn add_whitelist_email(
    State(state): State<AppState>,
    Json(body): Json<AddWhitelistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::validation_error("Invalid email address"));
    }
    if state.whitelist_repo.contains(&email).await? {
        return Err(ApiError::new(
            "CONFLICT",
            format!("Already whitelisted: {}", email),
        ));
    }

    let entry = state
        .whitelist_repo
        .add(&email, body.note.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /api/v1/admin/whitelist/{email}
async fn remove_whitelist_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.whitelist_repo.remove(&email).await?;
    if !removed {
        return Err(ApiError::not_found(format!("Not whitelisted: {}", email)));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// User management
// ============================================================================

/// Request body for updating a user's roles
#[derive(Debug, Deserialize)]
pub struct UpdateRolesRequest {
    /// Dash-delimited role string, e.g. "editor-dj"
    pub roles: String,
}

/// GET /api/v1/admin/users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.user_repo.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// PUT /api/v1/admin/users/{id}/roles
async fn update_user_roles(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRolesRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", id)))?;

    let roles: RoleSet = body.roles.parse().unwrap_or_default();
    state.user_repo.update_roles(user.id, &roles).await?;

    let updated = state
        .user_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::internal_error("User disappeared during update"))?;
    Ok(Json(updated.into()))
}

// ============================================================================
// Stream configuration
// ============================================================================

/// GET /api/v1/admin/stream-configs
async fn list_stream_configs(
    State(state): State<AppState>,
) -> Result<Json<Vec<StreamConfig>>, ApiError> {
    Ok(Json(state.stream_repo.list().await?))
}

/// POST /api/v1/admin/stream-configs
async fn create_stream_config(
    State(state): State<AppState>,
    Json(input): Json<UpdateStreamConfigInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_stream_input(&input)?;
    let config = state.stream_repo.create(&input).await?;
    Ok((StatusCode::CREATED, Json(config)))
}

/// PUT /api/v1/admin/stream-configs/{id}
async fn update_stream_config(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateStreamConfigInput>,
) -> Result<Json<StreamConfig>, ApiError> {
    validate_stream_input(&input)?;
    let config = state
        .stream_repo
        .update(id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Stream config not found: {}", id)))?;
    Ok(Json(config))
}

/// POST /api/v1/admin/stream-configs/{id}/activate
async fn activate_stream_config(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let activated = state.stream_repo.activate(id).await?;
    if !activated {
        return Err(ApiError::not_found(format!("Stream config not found: {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/stream-configs/{id}
async fn delete_stream_config(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.stream_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_stream_input(input: &UpdateStreamConfigInput) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::validation_error("Name is required"));
    }
    if !input.stream_url.starts_with("http://") && !input.stream_url.starts_with("https://") {
        return Err(ApiError::validation_error(
            "Stream URL must be an absolute http(s) URL",
        ));
    }
    Ok(())
}

// ============================================================================
// Stats
// ============================================================================

/// Process and request statistics for the dashboard
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_requests: u64,
    pub avg_response_time_us: f64,
    pub uptime_seconds: u64,
    pub memory_bytes: u64,
    pub rate_limited_clients: usize,
}

/// GET /api/v1/admin/stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let memory_bytes = {
        let mut system = sysinfo::System::new();
        let pid = sysinfo::get_current_pid()
            .map_err(|e| ApiError::internal_error(format!("Failed to resolve pid: {}", e)))?;
        system.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::Some(&[pid]),
            sysinfo::ProcessRefreshKind::new().with_memory(),
        );
        system.process(pid).map(|p| p.memory()).unwrap_or(0)
    };

    let rate_limited_clients =
        state.chat_limiter.tracked_keys().await + state.tldr_limiter.tracked_keys().await;

    Ok(Json(StatsResponse {
        total_requests: state.request_stats.total_requests(),
        avg_response_time_us: state.request_stats.avg_response_time_us(),
        uptime_seconds: state.request_stats.uptime_seconds(),
        memory_bytes,
        rate_limited_clients,
    }))
}
