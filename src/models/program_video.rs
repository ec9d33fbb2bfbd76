//! Program video model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A YouTube video attached to one of the station's programs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramVideo {
    /// Unique identifier
    pub id: i64,
    /// Video title
    pub title: String,
    /// YouTube video ID
    pub youtube_id: String,
    /// Program the video belongs to
    pub program: String,
    /// When the video was published on YouTube
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a program video
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgramVideoInput {
    pub title: String,
    pub youtube_id: String,
    pub program: String,
    pub published_at: Option<DateTime<Utc>>,
}
