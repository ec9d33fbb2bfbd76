//! Program video API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::api::middleware::{require_roles, ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateProgramVideoInput, ProgramVideo};
use crate::services::YoutubeSearchResult;

/// Roles allowed to mutate program videos
const VIDEO_EDITOR_ROLES: &[&str] = &["admin", "editor"];

/// Query parameters for listing videos
#[derive(Debug, Deserialize)]
pub struct VideoListQuery {
    pub program: Option<String>,
}

/// Query parameters for the YouTube search proxy
#[derive(Debug, Deserialize)]
pub struct VideoSearchQuery {
    pub q: String,
}

/// GET /api/v1/videos - List program videos
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<Json<Vec<ProgramVideo>>, ApiError> {
    let videos = state.video_repo.list(query.program.as_deref()).await?;
    Ok(Json(videos))
}

/// GET /api/v1/videos/search?q= - Proxy a YouTube search (staff)
pub async fn search_videos(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<VideoSearchQuery>,
) -> Result<Json<Vec<YoutubeSearchResult>>, ApiError> {
    require_roles(&user.0, VIDEO_EDITOR_ROLES)?;

    if query.q.trim().is_empty() {
        return Err(ApiError::validation_error("Search query is required"));
    }

    let results = state.youtube_client.search(query.q.trim(), 10).await?;
    Ok(Json(results))
}

/// POST /api/v1/videos - Attach a video to a program (staff)
pub async fn create_video(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateProgramVideoInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_roles(&user.0, VIDEO_EDITOR_ROLES)?;

    if input.youtube_id.trim().is_empty() || input.program.trim().is_empty() {
        return Err(ApiError::validation_error(
            "YouTube ID and program are required",
        ));
    }

    let video = ProgramVideo {
        id: 0,
        title: input.title,
        youtube_id: input.youtube_id.trim().to_string(),
        program: input.program.trim().to_string(),
        published_at: input.published_at,
        created_at: Utc::now(),
    };

    let created = state.video_repo.create(&video).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/v1/videos/{id} - Detach a video (staff)
pub async fn delete_video(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_roles(&user.0, VIDEO_EDITOR_ROLES)?;
    state.video_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
