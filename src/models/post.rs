//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Blog post entity.
///
/// Content is authored in markdown; `content_html` holds the rendered
/// output and is regenerated on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// URL slug (unique)
    pub slug: String,
    /// Title
    pub title: String,
    /// Short excerpt shown in listings
    pub excerpt: Option<String>,
    /// Markdown source
    pub content: String,
    /// Rendered HTML
    pub content_html: String,
    /// Storage key of the cover image
    pub cover_key: Option<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status
    pub status: PostStatus,
    /// When the post went live
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Draft - visible to staff only
    #[default]
    Draft,
    /// Published - publicly visible
    Published,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Draft => write!(f, "draft"),
            PostStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            _ => Err(anyhow::anyhow!("Invalid post status: {}", s)),
        }
    }
}

/// Input for creating a post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_key: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
}

/// Input for updating a post; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_key: Option<String>,
    pub status: Option<PostStatus>,
}

/// Pagination parameters for list endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl ListParams {
    /// Zero-based row offset for the current page
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.page_size as i64
    }

    /// Page size clamped to a sane range
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100) as i64
    }
}

/// A page of results plus the total row count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            page_size: params.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_status_roundtrip() {
        assert_eq!(PostStatus::from_str("draft").unwrap(), PostStatus::Draft);
        assert_eq!(
            PostStatus::from_str("Published").unwrap(),
            PostStatus::Published
        );
        assert!(PostStatus::from_str("archived").is_err());
        assert_eq!(PostStatus::Published.to_string(), "published");
    }

    #[test]
    fn test_list_params_offset() {
        let params = ListParams {
            page: 3,
            page_size: 20,
        };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_list_params_clamps_page_size() {
        let params = ListParams {
            page: 1,
            page_size: 5000,
        };
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn test_list_params_page_zero_treated_as_first() {
        let params = ListParams {
            page: 0,
            page_size: 10,
        };
        assert_eq!(params.offset(), 0);
    }
}
