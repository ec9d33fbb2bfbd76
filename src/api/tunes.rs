//! Tune tracker API endpoints
//!
//! The public endpoint serves a week's chart (latest by default). Staff
//! with the `admin` or `dj` role upsert a week; `previous_position` and
//! `weeks_on_chart` are derived from the prior week's chart on write.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::middleware::{require_roles, ApiError, AppState, AuthenticatedUser};
use crate::models::{TuneEntry, TuneEntryInput};

/// Roles allowed to mutate the chart
const TUNE_EDITOR_ROLES: &[&str] = &["admin", "dj"];

/// Query parameters for chart reads
#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    /// Chart week (any date within it); latest chart when absent
    pub week: Option<NaiveDate>,
}

/// A week's chart
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub week_of: NaiveDate,
    pub entries: Vec<TuneEntry>,
}

/// Request body for upserting a week's chart
#[derive(Debug, Deserialize)]
pub struct UpsertChartRequest {
    pub week_of: NaiveDate,
    pub entries: Vec<TuneEntryInput>,
}

/// GET /api/v1/tunes - Get a week's chart
pub async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartResponse>, ApiError> {
    let week_of = match query.week {
        Some(week) => monday_of(week),
        None => state
            .tune_repo
            .latest_week()
            .await?
            .ok_or_else(|| ApiError::not_found("No chart published yet"))?,
    };

    let entries = state.tune_repo.list_week(week_of).await?;
    Ok(Json(ChartResponse { week_of, entries }))
}

/// GET /api/v1/tunes/weeks - List chart weeks, newest first
pub async fn list_weeks(State(state): State<AppState>) -> Result<Json<Vec<NaiveDate>>, ApiError> {
    let weeks = state.tune_repo.list_weeks(52).await?;
    Ok(Json(weeks))
}

/// PUT /api/v1/tunes - Upsert a week's chart (staff)
pub async fn upsert_chart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpsertChartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_roles(&user.0, TUNE_EDITOR_ROLES)?;

    if body.entries.is_empty() {
        return Err(ApiError::validation_error("Chart must not be empty"));
    }
    let mut seen_positions = std::collections::HashSet::new();
    for entry in &body.entries {
        if entry.position < 1 {
            return Err(ApiError::validation_error("Positions are 1-based"));
        }
        if !seen_positions.insert(entry.position) {
            return Err(ApiError::validation_error(format!(
                "Duplicate position: {}",
                entry.position
            )));
        }
        if entry.title.trim().is_empty() || entry.artist.trim().is_empty() {
            return Err(ApiError::validation_error(
                "Title and artist are required on every entry",
            ));
        }
    }

    let week_of = monday_of(body.week_of);

    // Derive movement bookkeeping from the previous week's chart
    let previous_week = week_of - Duration::days(7);
    let previous_chart = state.tune_repo.list_week(previous_week).await?;
    let previous_by_track: HashMap<(String, String), &TuneEntry> = previous_chart
        .iter()
        .map(|e| ((normalize(&e.title), normalize(&e.artist)), e))
        .collect();

    let now = Utc::now();
    let entries: Vec<TuneEntry> = body
        .entries
        .iter()
        .map(|input| {
            let prior = previous_by_track.get(&(normalize(&input.title), normalize(&input.artist)));
            TuneEntry {
                id: 0,
                week_of,
                position: input.position,
                title: input.title.trim().to_string(),
                artist: input.artist.trim().to_string(),
                previous_position: prior.map(|e| e.position),
                weeks_on_chart: prior.map(|e| e.weeks_on_chart + 1).unwrap_or(1),
                created_at: now,
            }
        })
        .collect();

    state.tune_repo.replace_week(week_of, &entries).await?;

    let saved = state.tune_repo.list_week(week_of).await?;
    Ok((
        StatusCode::OK,
        Json(ChartResponse {
            week_of,
            entries: saved,
        }),
    ))
}

/// POST /api/v1/tunes/predict - Forward the latest chart to the external
/// prediction service (staff)
pub async fn predict_chart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_roles(&user.0, TUNE_EDITOR_ROLES)?;

    if !state.predict_client.is_enabled() {
        return Err(ApiError::validation_error(
            "Prediction service is not configured",
        ));
    }

    let week_of = state
        .tune_repo
        .latest_week()
        .await?
        .ok_or_else(|| ApiError::not_found("No chart published yet"))?;
    let chart = state.tune_repo.list_week(week_of).await?;

    let prediction = state.predict_client.predict(&chart).await?;
    Ok(Json(prediction))
}

/// Snap any date to the Monday of its week
fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Track identity for week-over-week matching
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monday_of() {
        // 2026-08-07 is a Friday
        let friday = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        assert_eq!(monday_of(friday), monday);
        assert_eq!(monday_of(monday), monday);
    }

    #[test]
    fn test_normalize_track_identity() {
        assert_eq!(normalize("  Midnight Drive "), normalize("midnight drive"));
    }
}
