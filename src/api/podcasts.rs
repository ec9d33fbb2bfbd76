//! Podcast API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::api::middleware::{require_roles, ApiError, AppState, AuthenticatedUser};
use crate::models::{CreatePodcastInput, Podcast, UpdatePodcastInput};

/// Roles allowed to mutate podcasts
const PODCAST_EDITOR_ROLES: &[&str] = &["admin", "editor", "dj"];

/// GET /api/v1/podcasts - List published episodes
pub async fn list_podcasts(State(state): State<AppState>) -> Result<Json<Vec<Podcast>>, ApiError> {
    let episodes = state.podcast_repo.list(true).await?;
    Ok(Json(episodes))
}

/// GET /api/v1/podcasts/{slug} - Get a published episode
pub async fn get_podcast(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Podcast>, ApiError> {
    let episode = state
        .podcast_repo
        .get_by_slug(&slug)
        .await?
        .filter(|p| p.published)
        .ok_or_else(|| ApiError::not_found(format!("Podcast not found: {}", slug)))?;
    Ok(Json(episode))
}

/// GET /api/v1/podcasts/all - List every episode including drafts (staff)
pub async fn list_all_podcasts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Podcast>>, ApiError> {
    require_roles(&user.0, PODCAST_EDITOR_ROLES)?;
    let episodes = state.podcast_repo.list(false).await?;
    Ok(Json(episodes))
}

/// POST /api/v1/podcasts - Create an episode (staff)
pub async fn create_podcast(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<CreatePodcastInput>,
) -> Result<impl IntoResponse, ApiError> {
    require_roles(&user.0, PODCAST_EDITOR_ROLES)?;

    if input.slug.is_empty() || input.audio_key.trim().is_empty() {
        return Err(ApiError::validation_error(
            "Slug and audio key are required",
        ));
    }
    if state.podcast_repo.get_by_slug(&input.slug).await?.is_some() {
        return Err(ApiError::new(
            "CONFLICT",
            format!("Slug already in use: {}", input.slug),
        ));
    }

    let now = Utc::now();
    let episode = Podcast {
        id: 0,
        slug: input.slug,
        title: input.title,
        description: input.description,
        audio_key: input.audio_key,
        cover_key: input.cover_key,
        duration_secs: input.duration_secs,
        published: input.published,
        published_at: input.published.then_some(now),
        created_at: now,
        updated_at: now,
    };

    let created = state.podcast_repo.create(&episode).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/podcasts/id/{id} - Update an episode (staff)
pub async fn update_podcast(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePodcastInput>,
) -> Result<Json<Podcast>, ApiError> {
    require_roles(&user.0, PODCAST_EDITOR_ROLES)?;

    let mut episode = state
        .podcast_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Podcast not found: {}", id)))?;

    if let Some(slug) = input.slug {
        if slug != episode.slug && state.podcast_repo.get_by_slug(&slug).await?.is_some() {
            return Err(ApiError::new(
                "CONFLICT",
                format!("Slug already in use: {}", slug),
            ));
        }
        episode.slug = slug;
    }
    if let Some(title) = input.title {
        episode.title = title;
    }
    if let Some(description) = input.description {
        episode.description = description;
    }
    if let Some(audio_key) = input.audio_key {
        episode.audio_key = audio_key;
    }
    if let Some(cover_key) = input.cover_key {
        episode.cover_key = (!cover_key.trim().is_empty()).then_some(cover_key);
    }
    if let Some(duration_secs) = input.duration_secs {
        episode.duration_secs = Some(duration_secs);
    }
    if let Some(published) = input.published {
        if published && episode.published_at.is_none() {
            episode.published_at = Some(Utc::now());
        }
        episode.published = published;
    }

    let updated = state.podcast_repo.update(&episode).await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/podcasts/id/{id} - Delete an episode (staff)
pub async fn delete_podcast(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_roles(&user.0, PODCAST_EDITOR_ROLES)?;

    if state.podcast_repo.get_by_id(id).await?.is_none() {
        return Err(ApiError::not_found(format!("Podcast not found: {}", id)));
    }
    state.podcast_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
