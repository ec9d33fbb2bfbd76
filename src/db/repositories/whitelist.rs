//! Whitelisted email repository
//!
//! The whitelist gates sign-up and sign-in: an email not present here
//! cannot obtain a session (the very first user is exempt and bootstraps
//! as admin).

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::WhitelistedEmail;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Whitelist repository trait
#[async_trait]
pub trait WhitelistRepository: Send + Sync {
    /// Add an email to the whitelist
    async fn add(&self, email: &str, note: Option<&str>) -> Result<WhitelistedEmail>;

    /// Remove an email from the whitelist, returning whether it was present
    async fn remove(&self, email: &str) -> Result<bool>;

    /// List all whitelisted emails
    async fn list(&self) -> Result<Vec<WhitelistedEmail>>;

    /// Check whether an email is whitelisted (case-insensitive)
    async fn contains(&self, email: &str) -> Result<bool>;
}

/// SQLx-based whitelist repository implementation
pub struct SqlxWhitelistRepository {
    pool: DynDatabasePool,
}

impl SqlxWhitelistRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn WhitelistRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl WhitelistRepository for SqlxWhitelistRepository {
    async fn add(&self, email: &str, note: Option<&str>) -> Result<WhitelistedEmail> {
        let email = email.trim().to_lowercase();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_sqlite(self.pool.as_sqlite().unwrap(), &email, note).await
            }
            DatabaseDriver::Mysql => add_mysql(self.pool.as_mysql().unwrap(), &email, note).await,
        }
    }

    async fn remove(&self, email: &str) -> Result<bool> {
        let email = email.trim().to_lowercase();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let result = sqlx::query("DELETE FROM whitelisted_emails WHERE email = ?")
                    .bind(&email)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to remove whitelisted email")?;
                Ok(result.rows_affected() > 0)
            }
            DatabaseDriver::Mysql => {
                let result = sqlx::query("DELETE FROM whitelisted_emails WHERE email = ?")
                    .bind(&email)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to remove whitelisted email")?;
                Ok(result.rows_affected() > 0)
            }
        }
    }

    async fn list(&self) -> Result<Vec<WhitelistedEmail>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn contains(&self, email: &str) -> Result<bool> {
        let email = email.trim().to_lowercase();
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query_scalar("SELECT COUNT(*) FROM whitelisted_emails WHERE email = ?")
                    .bind(&email)
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to check whitelist")?
            }
            DatabaseDriver::Mysql => {
                sqlx::query_scalar("SELECT COUNT(*) FROM whitelisted_emails WHERE email = ?")
                    .bind(&email)
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to check whitelist")?
            }
        };
        Ok(count > 0)
    }
}

// SQLite implementations

async fn add_sqlite(pool: &SqlitePool, email: &str, note: Option<&str>) -> Result<WhitelistedEmail> {
    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO whitelisted_emails (email, note, created_at) VALUES (?, ?, ?)")
            .bind(email)
            .bind(note)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to add whitelisted email")?;

    Ok(WhitelistedEmail {
        id: result.last_insert_rowid(),
        email: email.to_string(),
        note: note.map(String::from),
        created_at: now,
    })
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<WhitelistedEmail>> {
    let rows = sqlx::query(
        "SELECT id, email, note, created_at FROM whitelisted_emails ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list whitelisted emails")?;

    Ok(rows
        .iter()
        .map(|row| WhitelistedEmail {
            id: row.get("id"),
            email: row.get("email"),
            note: row.get("note"),
            created_at: row.get("created_at"),
        })
        .collect())
}

// MySQL implementations

async fn add_mysql(pool: &MySqlPool, email: &str, note: Option<&str>) -> Result<WhitelistedEmail> {
    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO whitelisted_emails (email, note, created_at) VALUES (?, ?, ?)")
            .bind(email)
            .bind(note)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to add whitelisted email")?;

    Ok(WhitelistedEmail {
        id: result.last_insert_id() as i64,
        email: email.to_string(),
        note: note.map(String::from),
        created_at: now,
    })
}

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<WhitelistedEmail>> {
    let rows = sqlx::query(
        "SELECT id, email, note, created_at FROM whitelisted_emails ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list whitelisted emails")?;

    Ok(rows
        .iter()
        .map(|row| WhitelistedEmail {
            id: row.get("id"),
            email: row.get("email"),
            note: row.get("note"),
            created_at: row.get("created_at"),
        })
        .collect())
}
