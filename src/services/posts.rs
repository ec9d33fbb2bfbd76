//! Post service
//!
//! Business logic for blog posts: markdown rendering on write, cache-backed
//! published reads, and cache invalidation on every mutation.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::PostRepository;
use crate::models::{CreatePostInput, ListParams, PagedResult, Post, PostStatus, UpdatePostInput};
use crate::services::markdown::MarkdownRenderer;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Cache TTL for published post reads
const POST_CACHE_TTL: Duration = Duration::from_secs(300);

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Slug already in use: {0}")]
    SlugExists(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    cache: Arc<MemoryCache>,
    renderer: MarkdownRenderer,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, cache: Arc<MemoryCache>) -> Self {
        Self {
            repo,
            cache,
            renderer: MarkdownRenderer::new(),
        }
    }

    /// Create a post; markdown is rendered before the write.
    pub async fn create(&self, input: CreatePostInput, author_id: i64) -> Result<Post, PostServiceError> {
        validate_slug(&input.slug)?;
        if input.title.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Title must not be empty".to_string(),
            ));
        }
        if self.repo.get_by_slug(&input.slug).await?.is_some() {
            return Err(PostServiceError::SlugExists(input.slug));
        }

        let now = Utc::now();
        let post = Post {
            id: 0,
            content_html: self.renderer.render(&input.content),
            slug: input.slug,
            title: input.title,
            excerpt: input.excerpt,
            content: input.content,
            cover_key: input.cover_key,
            author_id,
            status: input.status,
            published_at: matches!(input.status, PostStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&post).await?;
        self.invalidate_cache().await;
        Ok(created)
    }

    /// Update a post; `None` fields keep their current value.
    pub async fn update(&self, id: i64, input: UpdatePostInput) -> Result<Post, PostServiceError> {
        let mut post = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| PostServiceError::NotFound(id.to_string()))?;

        if let Some(slug) = input.slug {
            validate_slug(&slug)?;
            if slug != post.slug && self.repo.get_by_slug(&slug).await?.is_some() {
                return Err(PostServiceError::SlugExists(slug));
            }
            post.slug = slug;
        }
        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(PostServiceError::ValidationError(
                    "Title must not be empty".to_string(),
                ));
            }
            post.title = title;
        }
        if let Some(excerpt) = input.excerpt {
            post.excerpt = (!excerpt.trim().is_empty()).then_some(excerpt);
        }
        if let Some(content) = input.content {
            post.content_html = self.renderer.render(&content);
            post.content = content;
        }
        if let Some(cover_key) = input.cover_key {
            post.cover_key = (!cover_key.trim().is_empty()).then_some(cover_key);
        }
        if let Some(status) = input.status {
            if status == PostStatus::Published && post.published_at.is_none() {
                post.published_at = Some(Utc::now());
            }
            post.status = status;
        }

        let updated = self.repo.update(&post).await?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete a post by ID
    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        if self.repo.get_by_id(id).await?.is_none() {
            return Err(PostServiceError::NotFound(id.to_string()));
        }
        self.repo.delete(id).await?;
        self.invalidate_cache().await;
        Ok(())
    }

    /// Get a published post by slug, via the cache.
    pub async fn get_published(&self, slug: &str) -> Result<Option<Post>, PostServiceError> {
        let cache_key = format!("posts:slug:{}", slug);
        if let Ok(Some(post)) = self.cache.get::<Post>(&cache_key).await {
            return Ok(Some(post));
        }

        let post = self
            .repo
            .get_by_slug(slug)
            .await?
            .filter(|p| p.status == PostStatus::Published);

        if let Some(ref post) = post {
            if let Err(e) = self.cache.set(&cache_key, post, POST_CACHE_TTL).await {
                tracing::warn!("Failed to cache post: {}", e);
            }
        }
        Ok(post)
    }

    /// Get any post by ID (dashboard view, no cache)
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>, PostServiceError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// List published posts with pagination, via the cache.
    pub async fn list_published(
        &self,
        params: ListParams,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let cache_key = format!("posts:list:{}:{}", params.page, params.page_size);
        if let Ok(Some(page)) = self.cache.get::<PagedResult<Post>>(&cache_key).await {
            return Ok(page);
        }

        let items = self.repo.list(Some(PostStatus::Published), params).await?;
        let total = self.repo.count(Some(PostStatus::Published)).await?;
        let page = PagedResult::new(items, total, params);

        if let Err(e) = self.cache.set(&cache_key, &page, POST_CACHE_TTL).await {
            tracing::warn!("Failed to cache post list: {}", e);
        }
        Ok(page)
    }

    /// List every post regardless of status (dashboard view)
    pub async fn list_all(&self, params: ListParams) -> Result<PagedResult<Post>, PostServiceError> {
        let items = self.repo.list(None, params).await?;
        let total = self.repo.count(None).await?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn invalidate_cache(&self) {
        if let Err(e) = self.cache.delete_pattern("posts:*").await {
            tracing::warn!("Failed to invalidate post cache: {}", e);
        }
    }
}

fn validate_slug(slug: &str) -> Result<(), PostServiceError> {
    if slug.is_empty()
        || !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(PostServiceError::ValidationError(format!(
            "Invalid slug: {}",
            slug
        )));
    }
    Ok(())
}
