//! Short link model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short link redirecting `/l/{slug}` to an arbitrary URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLink {
    /// Unique identifier
    pub id: i64,
    /// Short slug (unique)
    pub slug: String,
    /// Redirect target
    pub target_url: String,
    /// Number of times the link was followed
    pub hits: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a short link
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShortLinkInput {
    pub slug: String,
    pub target_url: String,
}
