//! Tune tracker model
//!
//! The tune tracker is the station's weekly chart. Each row is one chart
//! position for one week; a week's chart is the set of rows sharing the
//! same `week_of` date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One chart position for one week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneEntry {
    /// Unique identifier
    pub id: i64,
    /// Monday of the chart week
    pub week_of: NaiveDate,
    /// Chart position, 1-based
    pub position: i32,
    /// Track title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Position on the previous week's chart, if the track charted
    pub previous_position: Option<i32>,
    /// Number of consecutive weeks on the chart, including this one
    pub weeks_on_chart: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// One chart position as submitted when upserting a week.
///
/// `previous_position` and `weeks_on_chart` are derived server-side from
/// the prior week's chart.
#[derive(Debug, Clone, Deserialize)]
pub struct TuneEntryInput {
    pub position: i32,
    pub title: String,
    pub artist: String,
}
