//! Shared API response types
//!
//! Common response structures used across multiple API endpoints to keep
//! the wire format consistent.

use serde::Serialize;

use crate::models::{PagedResult, Post};

/// Full post response used in detail endpoints
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub content: String,
    pub content_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_key: Option<String>,
    pub author_id: i64,
    pub status: String,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Trimmed post response for list views
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_key: Option<String>,
    pub status: String,
    pub published_at: Option<String>,
}

/// Paginated post list response
#[derive(Debug, Serialize)]
pub struct PaginatedPostsResponse {
    pub posts: Vec<PostSummary>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            content_html: post.content_html,
            cover_key: post.cover_key,
            author_id: post.author_id,
            status: post.status.to_string(),
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            cover_key: post.cover_key,
            status: post.status.to_string(),
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

impl From<PagedResult<Post>> for PaginatedPostsResponse {
    fn from(page: PagedResult<Post>) -> Self {
        Self {
            posts: page.items.into_iter().map(PostSummary::from).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}
