//! Blog post API endpoints
//!
//! Public read endpoints serve published posts only; mutations require
//! the `admin` or `editor` role.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::middleware::{require_roles, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{PaginatedPostsResponse, PostResponse};
use crate::models::{CreatePostInput, ListParams, UpdatePostInput};

/// Roles allowed to mutate posts
const POST_EDITOR_ROLES: &[&str] = &["admin", "editor"];

/// GET /api/v1/posts - List published posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedPostsResponse>, ApiError> {
    let page = state.post_service.list_published(params).await?;
    Ok(Json(page.into()))
}

/// GET /api/v1/posts/{slug} - Get a published post
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_service
        .get_published(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", slug)))?;
    Ok(Json(post.into()))
}

/// GET /api/v1/posts/all - List every post including drafts (staff)
pub async fn list_all_posts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedPostsResponse>, ApiError> {
    require_roles(&user.0, POST_EDITOR_ROLES)?;
    let page = state.post_service.list_all(params).await?;
    Ok(Json(page.into()))
}

/// POST /api/v1/posts - Create a post (staff)
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_roles(&user.0, POST_EDITOR_ROLES)?;
    let post = state.post_service.create(input, user.0.id).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// GET /api/v1/posts/id/{id} - Get any post by ID (staff)
pub async fn get_post_by_id(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    require_roles(&user.0, POST_EDITOR_ROLES)?;
    let post = state
        .post_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", id)))?;
    Ok(Json(post.into()))
}

/// PUT /api/v1/posts/id/{id} - Update a post (staff)
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    require_roles(&user.0, POST_EDITOR_ROLES)?;
    let post = state.post_service.update(id, input).await?;
    Ok(Json(post.into()))
}

/// DELETE /api/v1/posts/id/{id} - Delete a post (staff)
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_roles(&user.0, POST_EDITOR_ROLES)?;
    state.post_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
