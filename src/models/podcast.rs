//! Podcast model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Podcast episode entity.
///
/// Audio and cover art live in object storage; the record holds their keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Podcast {
    /// Unique identifier
    pub id: i64,
    /// URL slug (unique)
    pub slug: String,
    /// Episode title
    pub title: String,
    /// Episode description
    pub description: String,
    /// Storage key of the audio file
    pub audio_key: String,
    /// Storage key of the cover image
    pub cover_key: Option<String>,
    /// Duration in seconds, if known
    pub duration_secs: Option<i64>,
    /// Whether the episode is publicly listed
    pub published: bool,
    /// When the episode went live
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a podcast episode
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePodcastInput {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub audio_key: String,
    pub cover_key: Option<String>,
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub published: bool,
}

/// Input for updating a podcast episode; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePodcastInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub audio_key: Option<String>,
    pub cover_key: Option<String>,
    pub duration_secs: Option<i64>,
    pub published: Option<bool>,
}
