//! Short link API endpoints
//!
//! `GET /l/{slug}` is the public redirect; management endpoints require
//! the `admin` or `editor` role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};

use crate::api::middleware::{require_roles, ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateShortLinkInput, ShortLink};

/// Roles allowed to manage short links
const LINK_EDITOR_ROLES: &[&str] = &["admin", "editor"];

/// GET /l/{slug} - Follow a short link
pub async fn follow_link(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Redirect, ApiError> {
    let link = state
        .link_repo
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Short link not found: {}", slug)))?;

    // Hit counting is best effort; the redirect matters more
    if let Err(e) = state.link_repo.increment_hits(link.id).await {
        tracing::warn!("Failed to count short link hit: {}", e);
    }

    Ok(Redirect::temporary(&link.target_url))
}

/// GET /api/v1/links - List short links (staff)
pub async fn list_links(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ShortLink>>, ApiError> {
    require_roles(&user.0, LINK_EDITOR_ROLES)?;
    let links = state.link_repo.list().await?;
    Ok(Json(links))
}

/// POST /api/v1/links - Create a short link (staff)
pub async fn create_link(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreateShortLinkInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_roles(&user.0, LINK_EDITOR_ROLES)?;

    let slug = input.slug.trim();
    if slug.is_empty()
        || !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation_error(format!("Invalid slug: {}", slug)));
    }
    if !input.target_url.starts_with("http://") && !input.target_url.starts_with("https://") {
        return Err(ApiError::validation_error(
            "Target must be an absolute http(s) URL",
        ));
    }
    if state.link_repo.get_by_slug(slug).await?.is_some() {
        return Err(ApiError::new(
            "CONFLICT",
            format!("Slug already in use: {}", slug),
        ));
    }

    let link = state.link_repo.create(slug, &input.target_url).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// DELETE /api/v1/links/{id} - Delete a short link (staff)
pub async fn delete_link(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_roles(&user.0, LINK_EDITOR_ROLES)?;
    state.link_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
