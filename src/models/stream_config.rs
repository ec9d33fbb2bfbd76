//! Stream configuration model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An upstream stream configuration.
///
/// At most one row is active at a time; the relay connects to the active
/// row's `stream_url` and the admin dashboard can switch rows without a
/// restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Unique identifier
    pub id: i64,
    /// Human-readable name ("main transmitter", "backup encoder")
    pub name: String,
    /// Upstream Shoutcast/Icecast URL
    pub stream_url: String,
    /// Optional fallback URL surfaced to players
    pub fallback_url: Option<String>,
    /// Whether this row is the active one
    pub is_active: bool,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or updating a stream configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStreamConfigInput {
    pub name: String,
    pub stream_url: String,
    pub fallback_url: Option<String>,
}
