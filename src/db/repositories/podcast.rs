//! Podcast repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Podcast;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const PODCAST_COLUMNS: &str = "id, slug, title, description, audio_key, cover_key, duration_secs, published, published_at, created_at, updated_at";

#[async_trait]
pub trait PodcastRepository: Send + Sync {
    async fn create(&self, podcast: &Podcast) -> Result<Podcast>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Podcast>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Podcast>>;
    /// List episodes, newest first; `published_only` hides drafts
    async fn list(&self, published_only: bool) -> Result<Vec<Podcast>>;
    async fn update(&self, podcast: &Podcast) -> Result<Podcast>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxPodcastRepository {
    pool: DynDatabasePool,
}

impl SqlxPodcastRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PodcastRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PodcastRepository for SqlxPodcastRepository {
    async fn create(&self, podcast: &Podcast) -> Result<Podcast> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), podcast).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), podcast).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Podcast>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Podcast>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
        }
    }

    async fn list(&self, published_only: bool) -> Result<Vec<Podcast>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), published_only).await
            }
            DatabaseDriver::Mysql => {
                list_mysql(self.pool.as_mysql().unwrap(), published_only).await
            }
        }
    }

    async fn update(&self, podcast: &Podcast) -> Result<Podcast> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), podcast).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), podcast).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM podcasts WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete podcast")?;
                Ok(())
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM podcasts WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete podcast")?;
                Ok(())
            }
        }
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, podcast: &Podcast) -> Result<Podcast> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO podcasts (slug, title, description, audio_key, cover_key, duration_secs, published, published_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&podcast.slug)
    .bind(&podcast.title)
    .bind(&podcast.description)
    .bind(&podcast.audio_key)
    .bind(&podcast.cover_key)
    .bind(podcast.duration_secs)
    .bind(podcast.published)
    .bind(podcast.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create podcast")?;

    Ok(Podcast {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..podcast.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Podcast>> {
    let row = sqlx::query(&format!("SELECT {} FROM podcasts WHERE id = ?", PODCAST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get podcast")?;
    Ok(row.map(|r| row_to_podcast_sqlite(&r)))
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Podcast>> {
    let row = sqlx::query(&format!("SELECT {} FROM podcasts WHERE slug = ?", PODCAST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get podcast by slug")?;
    Ok(row.map(|r| row_to_podcast_sqlite(&r)))
}

async fn list_sqlite(pool: &SqlitePool, published_only: bool) -> Result<Vec<Podcast>> {
    let rows = if published_only {
        sqlx::query(&format!(
            "SELECT {} FROM podcasts WHERE published = 1 ORDER BY published_at DESC, created_at DESC",
            PODCAST_COLUMNS
        ))
        .fetch_all(pool)
        .await
    } else {
        sqlx::query(&format!(
            "SELECT {} FROM podcasts ORDER BY created_at DESC",
            PODCAST_COLUMNS
        ))
        .fetch_all(pool)
        .await
    }
    .context("Failed to list podcasts")?;

    Ok(rows.iter().map(row_to_podcast_sqlite).collect())
}

async fn update_sqlite(pool: &SqlitePool, podcast: &Podcast) -> Result<Podcast> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE podcasts SET slug = ?, title = ?, description = ?, audio_key = ?, cover_key = ?, duration_secs = ?, published = ?, published_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&podcast.slug)
    .bind(&podcast.title)
    .bind(&podcast.description)
    .bind(&podcast.audio_key)
    .bind(&podcast.cover_key)
    .bind(podcast.duration_secs)
    .bind(podcast.published)
    .bind(podcast.published_at)
    .bind(now)
    .bind(podcast.id)
    .execute(pool)
    .await
    .context("Failed to update podcast")?;

    get_by_id_sqlite(pool, podcast.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Podcast not found after update"))
}

fn row_to_podcast_sqlite(row: &sqlx::sqlite::SqliteRow) -> Podcast {
    Podcast {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        audio_key: row.get("audio_key"),
        cover_key: row.get("cover_key"),
        duration_secs: row.get("duration_secs"),
        published: row.get("published"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, podcast: &Podcast) -> Result<Podcast> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO podcasts (slug, title, description, audio_key, cover_key, duration_secs, published, published_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&podcast.slug)
    .bind(&podcast.title)
    .bind(&podcast.description)
    .bind(&podcast.audio_key)
    .bind(&podcast.cover_key)
    .bind(podcast.duration_secs)
    .bind(podcast.published)
    .bind(podcast.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create podcast")?;

    Ok(Podcast {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..podcast.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Podcast>> {
    let row = sqlx::query(&format!("SELECT {} FROM podcasts WHERE id = ?", PODCAST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get podcast")?;
    Ok(row.map(|r| row_to_podcast_mysql(&r)))
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Podcast>> {
    let row = sqlx::query(&format!("SELECT {} FROM podcasts WHERE slug = ?", PODCAST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get podcast by slug")?;
    Ok(row.map(|r| row_to_podcast_mysql(&r)))
}

async fn list_mysql(pool: &MySqlPool, published_only: bool) -> Result<Vec<Podcast>> {
    let rows = if published_only {
        sqlx::query(&format!(
            "SELECT {} FROM podcasts WHERE published = 1 ORDER BY published_at DESC, created_at DESC",
            PODCAST_COLUMNS
        ))
        .fetch_all(pool)
        .await
    } else {
        sqlx::query(&format!(
            "SELECT {} FROM podcasts ORDER BY created_at DESC",
            PODCAST_COLUMNS
        ))
        .fetch_all(pool)
        .await
    }
    .context("Failed to list podcasts")?;

    Ok(rows.iter().map(row_to_podcast_mysql).collect())
}

async fn update_mysql(pool: &MySqlPool, podcast: &Podcast) -> Result<Podcast> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE podcasts SET slug = ?, title = ?, description = ?, audio_key = ?, cover_key = ?, duration_secs = ?, published = ?, published_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&podcast.slug)
    .bind(&podcast.title)
    .bind(&podcast.description)
    .bind(&podcast.audio_key)
    .bind(&podcast.cover_key)
    .bind(podcast.duration_secs)
    .bind(podcast.published)
    .bind(podcast.published_at)
    .bind(now)
    .bind(podcast.id)
    .execute(pool)
    .await
    .context("Failed to update podcast")?;

    get_by_id_mysql(pool, podcast.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Podcast not found after update"))
}

fn row_to_podcast_mysql(row: &sqlx::mysql::MySqlRow) -> Podcast {
    Podcast {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        audio_key: row.get("audio_key"),
        cover_key: row.get("cover_key"),
        duration_secs: row.get("duration_secs"),
        published: row.get("published"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxPodcastRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPodcastRepository::new(pool)
    }

    fn test_podcast(slug: &str, published: bool) -> Podcast {
        let now = Utc::now();
        Podcast {
            id: 0,
            slug: slug.to_string(),
            title: "Episode".to_string(),
            description: "A show".to_string(),
            audio_key: format!("podcasts/{}.mp3", slug),
            cover_key: None,
            duration_secs: Some(1800),
            published,
            published_at: published.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_podcast() {
        let repo = setup().await;
        let created = repo
            .create(&test_podcast("ep-1", true))
            .await
            .expect("Failed to create");
        assert!(created.id > 0);

        let found = repo
            .get_by_slug("ep-1")
            .await
            .unwrap()
            .expect("Podcast not found");
        assert_eq!(found.audio_key, "podcasts/ep-1.mp3");
        assert!(found.published);
    }

    #[tokio::test]
    async fn test_list_published_only() {
        let repo = setup().await;
        repo.create(&test_podcast("pub", true)).await.unwrap();
        repo.create(&test_podcast("draft", false)).await.unwrap();

        let published = repo.list(true).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "pub");

        let all = repo.list(false).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = setup().await;
        let mut podcast = repo.create(&test_podcast("ep", false)).await.unwrap();

        podcast.published = true;
        podcast.published_at = Some(Utc::now());
        let updated = repo.update(&podcast).await.unwrap();
        assert!(updated.published);

        repo.delete(podcast.id).await.unwrap();
        assert!(repo.get_by_id(podcast.id).await.unwrap().is_none());
    }
}
