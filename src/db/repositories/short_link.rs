//! Short link repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::ShortLink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ShortLinkRepository: Send + Sync {
    async fn create(&self, slug: &str, target_url: &str) -> Result<ShortLink>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<ShortLink>>;
    async fn list(&self) -> Result<Vec<ShortLink>>;
    async fn delete(&self, id: i64) -> Result<()>;
    /// Bump the hit counter for a followed link
    async fn increment_hits(&self, id: i64) -> Result<()>;
}

pub struct SqlxShortLinkRepository {
    pool: DynDatabasePool,
}

impl SqlxShortLinkRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ShortLinkRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ShortLinkRepository for SqlxShortLinkRepository {
    async fn create(&self, slug: &str, target_url: &str) -> Result<ShortLink> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(self.pool.as_sqlite().unwrap(), slug, target_url).await
            }
            DatabaseDriver::Mysql => {
                create_mysql(self.pool.as_mysql().unwrap(), slug, target_url).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ShortLink>> {
        let row = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(
                    "SELECT id, slug, target_url, hits, created_at FROM short_links WHERE slug = ?",
                )
                .bind(slug)
                .fetch_optional(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to get short link")?;
                row.map(|r| row_to_link_sqlite(&r))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(
                    "SELECT id, slug, target_url, hits, created_at FROM short_links WHERE slug = ?",
                )
                .bind(slug)
                .fetch_optional(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to get short link")?;
                row.map(|r| row_to_link_mysql(&r))
            }
        };
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<ShortLink>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(
                    "SELECT id, slug, target_url, hits, created_at FROM short_links ORDER BY created_at DESC",
                )
                .fetch_all(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to list short links")?;
                Ok(rows.iter().map(row_to_link_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(
                    "SELECT id, slug, target_url, hits, created_at FROM short_links ORDER BY created_at DESC",
                )
                .fetch_all(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to list short links")?;
                Ok(rows.iter().map(row_to_link_mysql).collect())
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM short_links WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete short link")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM short_links WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete short link")?;
            }
        }
        Ok(())
    }

    async fn increment_hits(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("UPDATE short_links SET hits = hits + 1 WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to increment short link hits")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query("UPDATE short_links SET hits = hits + 1 WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to increment short link hits")?;
            }
        }
        Ok(())
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, slug: &str, target_url: &str) -> Result<ShortLink> {
    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO short_links (slug, target_url, hits, created_at) VALUES (?, ?, 0, ?)")
            .bind(slug)
            .bind(target_url)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to create short link")?;

    Ok(ShortLink {
        id: result.last_insert_rowid(),
        slug: slug.to_string(),
        target_url: target_url.to_string(),
        hits: 0,
        created_at: now,
    })
}

fn row_to_link_sqlite(row: &sqlx::sqlite::SqliteRow) -> ShortLink {
    ShortLink {
        id: row.get("id"),
        slug: row.get("slug"),
        target_url: row.get("target_url"),
        hits: row.get("hits"),
        created_at: row.get("created_at"),
    }
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, slug: &str, target_url: &str) -> Result<ShortLink> {
    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO short_links (slug, target_url, hits, created_at) VALUES (?, ?, 0, ?)")
            .bind(slug)
            .bind(target_url)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to create short link")?;

    Ok(ShortLink {
        id: result.last_insert_id() as i64,
        slug: slug.to_string(),
        target_url: target_url.to_string(),
        hits: 0,
        created_at: now,
    })
}

fn row_to_link_mysql(row: &sqlx::mysql::MySqlRow) -> ShortLink {
    ShortLink {
        id: row.get("id"),
        slug: row.get("slug"),
        target_url: row.get("target_url"),
        hits: row.get("hits"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxShortLinkRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxShortLinkRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let link = repo
            .create("tix", "https://tickets.example.edu/fall-gala")
            .await
            .expect("Failed to create link");
        assert_eq!(link.hits, 0);

        let found = repo.get_by_slug("tix").await.unwrap().expect("Not found");
        assert_eq!(found.target_url, "https://tickets.example.edu/fall-gala");
    }

    #[tokio::test]
    async fn test_increment_hits() {
        let repo = setup().await;
        let link = repo.create("hit", "https://example.edu").await.unwrap();

        repo.increment_hits(link.id).await.unwrap();
        repo.increment_hits(link.id).await.unwrap();

        let found = repo.get_by_slug("hit").await.unwrap().unwrap();
        assert_eq!(found.hits, 2);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let repo = setup().await;
        repo.create("dup", "https://a.example.edu").await.unwrap();
        assert!(repo.create("dup", "https://b.example.edu").await.is_err());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let repo = setup().await;
        let link = repo.create("one", "https://example.edu").await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);

        repo.delete(link.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }
}
