//! Whitelisted email model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pre-approved email address.
///
/// Sign-up and sign-in are rejected unless the email appears here
/// (the first user to register bootstraps as admin and is exempt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistedEmail {
    /// Unique identifier
    pub id: i64,
    /// Approved email address (unique, stored lowercase)
    pub email: String,
    /// Free-form note ("station manager 2026")
    pub note: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
