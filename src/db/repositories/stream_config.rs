//! Stream configuration repository
//!
//! At most one row is active; `activate` deactivates everything else in
//! the same transaction so the relay never sees two active upstreams.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{StreamConfig, UpdateStreamConfigInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const STREAM_COLUMNS: &str = "id, name, stream_url, fallback_url, is_active, updated_at";

#[async_trait]
pub trait StreamConfigRepository: Send + Sync {
    async fn create(&self, input: &UpdateStreamConfigInput) -> Result<StreamConfig>;
    async fn update(&self, id: i64, input: &UpdateStreamConfigInput) -> Result<Option<StreamConfig>>;
    async fn list(&self) -> Result<Vec<StreamConfig>>;
    /// The currently active configuration, if any
    async fn get_active(&self) -> Result<Option<StreamConfig>>;
    /// Make the given row active and every other row inactive
    async fn activate(&self, id: i64) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxStreamConfigRepository {
    pool: DynDatabasePool,
}

impl SqlxStreamConfigRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn StreamConfigRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl StreamConfigRepository for SqlxStreamConfigRepository {
    async fn create(&self, input: &UpdateStreamConfigInput) -> Result<StreamConfig> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateStreamConfigInput) -> Result<Option<StreamConfig>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), id, input).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), id, input).await,
        }
    }

    async fn list(&self) -> Result<Vec<StreamConfig>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&format!(
                    "SELECT {} FROM stream_configs ORDER BY id",
                    STREAM_COLUMNS
                ))
                .fetch_all(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to list stream configs")?;
                Ok(rows.iter().map(row_to_config_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&format!(
                    "SELECT {} FROM stream_configs ORDER BY id",
                    STREAM_COLUMNS
                ))
                .fetch_all(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to list stream configs")?;
                Ok(rows.iter().map(row_to_config_mysql).collect())
            }
        }
    }

    async fn get_active(&self) -> Result<Option<StreamConfig>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&format!(
                    "SELECT {} FROM stream_configs WHERE is_active = 1 LIMIT 1",
                    STREAM_COLUMNS
                ))
                .fetch_optional(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to get active stream config")?;
                Ok(row.map(|r| row_to_config_sqlite(&r)))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&format!(
                    "SELECT {} FROM stream_configs WHERE is_active = 1 LIMIT 1",
                    STREAM_COLUMNS
                ))
                .fetch_optional(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to get active stream config")?;
                Ok(row.map(|r| row_to_config_mysql(&r)))
            }
        }
    }

    async fn activate(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => activate_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => activate_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM stream_configs WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete stream config")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM stream_configs WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete stream config")?;
            }
        }
        Ok(())
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, input: &UpdateStreamConfigInput) -> Result<StreamConfig> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO stream_configs (name, stream_url, fallback_url, is_active, updated_at) VALUES (?, ?, ?, 0, ?)",
    )
    .bind(&input.name)
    .bind(&input.stream_url)
    .bind(&input.fallback_url)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create stream config")?;

    Ok(StreamConfig {
        id: result.last_insert_rowid(),
        name: input.name.clone(),
        stream_url: input.stream_url.clone(),
        fallback_url: input.fallback_url.clone(),
        is_active: false,
        updated_at: now,
    })
}

async fn update_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateStreamConfigInput,
) -> Result<Option<StreamConfig>> {
    let result = sqlx::query(
        "UPDATE stream_configs SET name = ?, stream_url = ?, fallback_url = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&input.name)
    .bind(&input.stream_url)
    .bind(&input.fallback_url)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update stream config")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query(&format!(
        "SELECT {} FROM stream_configs WHERE id = ?",
        STREAM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to reload stream config")?;
    Ok(row.map(|r| row_to_config_sqlite(&r)))
}

async fn activate_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("UPDATE stream_configs SET is_active = 0 WHERE is_active = 1")
        .execute(&mut *tx)
        .await
        .context("Failed to deactivate stream configs")?;

    let result = sqlx::query("UPDATE stream_configs SET is_active = 1, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to activate stream config")?;

    tx.commit().await.context("Failed to commit activation")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_config_sqlite(row: &sqlx::sqlite::SqliteRow) -> StreamConfig {
    StreamConfig {
        id: row.get("id"),
        name: row.get("name"),
        stream_url: row.get("stream_url"),
        fallback_url: row.get("fallback_url"),
        is_active: row.get("is_active"),
        updated_at: row.get("updated_at"),
    }
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, input: &UpdateStreamConfigInput) -> Result<StreamConfig> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO stream_configs (name, stream_url, fallback_url, is_active, updated_at) VALUES (?, ?, ?, 0, ?)",
    )
    .bind(&input.name)
    .bind(&input.stream_url)
    .bind(&input.fallback_url)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create stream config")?;

    Ok(StreamConfig {
        id: result.last_insert_id() as i64,
        name: input.name.clone(),
        stream_url: input.stream_url.clone(),
        fallback_url: input.fallback_url.clone(),
        is_active: false,
        updated_at: now,
    })
}

async fn update_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateStreamConfigInput,
) -> Result<Option<StreamConfig>> {
    let result = sqlx::query(
        "UPDATE stream_configs SET name = ?, stream_url = ?, fallback_url = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&input.name)
    .bind(&input.stream_url)
    .bind(&input.fallback_url)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update stream config")?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query(&format!(
        "SELECT {} FROM stream_configs WHERE id = ?",
        STREAM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to reload stream config")?;
    Ok(row.map(|r| row_to_config_mysql(&r)))
}

async fn activate_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("UPDATE stream_configs SET is_active = 0 WHERE is_active = 1")
        .execute(&mut *tx)
        .await
        .context("Failed to deactivate stream configs")?;

    let result = sqlx::query("UPDATE stream_configs SET is_active = 1, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to activate stream config")?;

    tx.commit().await.context("Failed to commit activation")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_config_mysql(row: &sqlx::mysql::MySqlRow) -> StreamConfig {
    StreamConfig {
        id: row.get("id"),
        name: row.get("name"),
        stream_url: row.get("stream_url"),
        fallback_url: row.get("fallback_url"),
        is_active: row.get("is_active"),
        updated_at: row.get("updated_at"),
    }
}
