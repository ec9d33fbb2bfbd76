//! Tune tracker repository
//!
//! A week's chart is replaced atomically: the old rows for that `week_of`
//! are deleted and the new rows inserted in a single transaction.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::TuneEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const TUNE_COLUMNS: &str =
    "id, week_of, position, title, artist, previous_position, weeks_on_chart, created_at";

#[async_trait]
pub trait TuneRepository: Send + Sync {
    /// Replace the chart for a week with the given entries
    async fn replace_week(&self, week_of: NaiveDate, entries: &[TuneEntry]) -> Result<()>;

    /// List a week's chart ordered by position
    async fn list_week(&self, week_of: NaiveDate) -> Result<Vec<TuneEntry>>;

    /// The most recent week that has a chart
    async fn latest_week(&self) -> Result<Option<NaiveDate>>;

    /// Distinct chart weeks, newest first
    async fn list_weeks(&self, limit: i64) -> Result<Vec<NaiveDate>>;
}

pub struct SqlxTuneRepository {
    pool: DynDatabasePool,
}

impl SqlxTuneRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TuneRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TuneRepository for SqlxTuneRepository {
    async fn replace_week(&self, week_of: NaiveDate, entries: &[TuneEntry]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                replace_week_sqlite(self.pool.as_sqlite().unwrap(), week_of, entries).await
            }
            DatabaseDriver::Mysql => {
                replace_week_mysql(self.pool.as_mysql().unwrap(), week_of, entries).await
            }
        }
    }

    async fn list_week(&self, week_of: NaiveDate) -> Result<Vec<TuneEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_week_sqlite(self.pool.as_sqlite().unwrap(), week_of).await
            }
            DatabaseDriver::Mysql => list_week_mysql(self.pool.as_mysql().unwrap(), week_of).await,
        }
    }

    async fn latest_week(&self) -> Result<Option<NaiveDate>> {
        let week: Option<NaiveDate> = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT MAX(week_of) FROM tune_entries")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get latest chart week")?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT MAX(week_of) FROM tune_entries")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get latest chart week")?
            }
        };
        Ok(week)
    }

    async fn list_weeks(&self, limit: i64) -> Result<Vec<NaiveDate>> {
        let weeks: Vec<NaiveDate> = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar(
                    "SELECT DISTINCT week_of FROM tune_entries ORDER BY week_of DESC LIMIT ?",
                )
                .bind(limit)
                .fetch_all(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to list chart weeks")?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar(
                    "SELECT DISTINCT week_of FROM tune_entries ORDER BY week_of DESC LIMIT ?",
                )
                .bind(limit)
                .fetch_all(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to list chart weeks")?
            }
        };
        Ok(weeks)
    }
}

// SQLite implementations

async fn replace_week_sqlite(
    pool: &SqlitePool,
    week_of: NaiveDate,
    entries: &[TuneEntry],
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM tune_entries WHERE week_of = ?")
        .bind(week_of)
        .execute(&mut *tx)
        .await
        .context("Failed to clear chart week")?;

    for entry in entries {
        sqlx::query(
            "INSERT INTO tune_entries (week_of, position, title, artist, previous_position, weeks_on_chart, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(week_of)
        .bind(entry.position)
        .bind(&entry.title)
        .bind(&entry.artist)
        .bind(entry.previous_position)
        .bind(entry.weeks_on_chart)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .context("Failed to insert chart entry")?;
    }

    tx.commit().await.context("Failed to commit chart week")?;
    Ok(())
}

async fn list_week_sqlite(pool: &SqlitePool, week_of: NaiveDate) -> Result<Vec<TuneEntry>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM tune_entries WHERE week_of = ? ORDER BY position",
        TUNE_COLUMNS
    ))
    .bind(week_of)
    .fetch_all(pool)
    .await
    .context("Failed to list chart week")?;

    Ok(rows.iter().map(row_to_entry_sqlite).collect())
}

fn row_to_entry_sqlite(row: &sqlx::sqlite::SqliteRow) -> TuneEntry {
    TuneEntry {
        id: row.get("id"),
        week_of: row.get("week_of"),
        position: row.get("position"),
        title: row.get("title"),
        artist: row.get("artist"),
        previous_position: row.get("previous_position"),
        weeks_on_chart: row.get("weeks_on_chart"),
        created_at: row.get("created_at"),
    }
}

// MySQL implementations

async fn replace_week_mysql(
    pool: &MySqlPool,
    week_of: NaiveDate,
    entries: &[TuneEntry],
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM tune_entries WHERE week_of = ?")
        .bind(week_of)
        .execute(&mut *tx)
        .await
        .context("Failed to clear chart week")?;

    for entry in entries {
        sqlx::query(
            "INSERT INTO tune_entries (week_of, position, title, artist, previous_position, weeks_on_chart, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(week_of)
        .bind(entry.position)
        .bind(&entry.title)
        .bind(&entry.artist)
        .bind(entry.previous_position)
        .bind(entry.weeks_on_chart)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .context("Failed to insert chart entry")?;
    }

    tx.commit().await.context("Failed to commit chart week")?;
    Ok(())
}

async fn list_week_mysql(pool: &MySqlPool, week_of: NaiveDate) -> Result<Vec<TuneEntry>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM tune_entries WHERE week_of = ? ORDER BY position",
        TUNE_COLUMNS
    ))
    .bind(week_of)
    .fetch_all(pool)
    .await
    .context("Failed to list chart week")?;

    Ok(rows.iter().map(row_to_entry_mysql).collect())
}

fn row_to_entry_mysql(row: &sqlx::mysql::MySqlRow) -> TuneEntry {
    TuneEntry {
        id: row.get("id"),
        week_of: row.get("week_of"),
        position: row.get("position"),
        title: row.get("title"),
        artist: row.get("artist"),
        previous_position: row.get("previous_position"),
        weeks_on_chart: row.get("weeks_on_chart"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Utc;

    async fn setup() -> SqlxTuneRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxTuneRepository::new(pool)
    }

    fn entry(position: i32, title: &str) -> TuneEntry {
        TuneEntry {
            id: 0,
            week_of: NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            position,
            title: title.to_string(),
            artist: "Artist".to_string(),
            previous_position: None,
            weeks_on_chart: 1,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_replace_and_list_week() {
        let repo = setup().await;
        let week = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();

        repo.replace_week(week, &[entry(1, "First"), entry(2, "Second")])
            .await
            .expect("Failed to replace week");

        let chart = repo.list_week(week).await.unwrap();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].position, 1);
        assert_eq!(chart[0].title, "First");
        assert_eq!(chart[1].position, 2);
    }

    #[tokio::test]
    async fn test_replace_week_is_atomic_overwrite() {
        let repo = setup().await;
        let week = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();

        repo.replace_week(week, &[entry(1, "Old")]).await.unwrap();
        repo.replace_week(week, &[entry(1, "New"), entry(2, "Also new")])
            .await
            .unwrap();

        let chart = repo.list_week(week).await.unwrap();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].title, "New");
    }

    #[tokio::test]
    async fn test_latest_week_and_list_weeks() {
        let repo = setup().await;
        assert!(repo.latest_week().await.unwrap().is_none());

        let w1 = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        let w2 = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        repo.replace_week(w1, &[entry(1, "Older")]).await.unwrap();
        repo.replace_week(w2, &[entry(1, "Newer")]).await.unwrap();

        assert_eq!(repo.latest_week().await.unwrap(), Some(w2));

        let weeks = repo.list_weeks(10).await.unwrap();
        assert_eq!(weeks, vec![w2, w1]);
    }
}
