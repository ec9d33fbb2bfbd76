//! Program video repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::ProgramVideo;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ProgramVideoRepository: Send + Sync {
    async fn create(&self, video: &ProgramVideo) -> Result<ProgramVideo>;
    /// List videos, optionally filtered by program, newest first
    async fn list(&self, program: Option<&str>) -> Result<Vec<ProgramVideo>>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxProgramVideoRepository {
    pool: DynDatabasePool,
}

impl SqlxProgramVideoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProgramVideoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProgramVideoRepository for SqlxProgramVideoRepository {
    async fn create(&self, video: &ProgramVideo) -> Result<ProgramVideo> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), video).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), video).await,
        }
    }

    async fn list(&self, program: Option<&str>) -> Result<Vec<ProgramVideo>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), program).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), program).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM program_videos WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete program video")?;
                Ok(())
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM program_videos WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete program video")?;
                Ok(())
            }
        }
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, video: &ProgramVideo) -> Result<ProgramVideo> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO program_videos (title, youtube_id, program, published_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&video.title)
    .bind(&video.youtube_id)
    .bind(&video.program)
    .bind(video.published_at)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create program video")?;

    Ok(ProgramVideo {
        id: result.last_insert_rowid(),
        created_at: now,
        ..video.clone()
    })
}

async fn list_sqlite(pool: &SqlitePool, program: Option<&str>) -> Result<Vec<ProgramVideo>> {
    let rows = match program {
        Some(program) => {
            sqlx::query(
                "SELECT id, title, youtube_id, program, published_at, created_at FROM program_videos WHERE program = ? ORDER BY published_at DESC, created_at DESC",
            )
            .bind(program)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(
                "SELECT id, title, youtube_id, program, published_at, created_at FROM program_videos ORDER BY published_at DESC, created_at DESC",
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list program videos")?;

    Ok(rows.iter().map(row_to_video_sqlite).collect())
}

fn row_to_video_sqlite(row: &sqlx::sqlite::SqliteRow) -> ProgramVideo {
    ProgramVideo {
        id: row.get("id"),
        title: row.get("title"),
        youtube_id: row.get("youtube_id"),
        program: row.get("program"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
    }
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, video: &ProgramVideo) -> Result<ProgramVideo> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO program_videos (title, youtube_id, program, published_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&video.title)
    .bind(&video.youtube_id)
    .bind(&video.program)
    .bind(video.published_at)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create program video")?;

    Ok(ProgramVideo {
        id: result.last_insert_id() as i64,
        created_at: now,
        ..video.clone()
    })
}

async fn list_mysql(pool: &MySqlPool, program: Option<&str>) -> Result<Vec<ProgramVideo>> {
    let rows = match program {
        Some(program) => {
            sqlx::query(
                "SELECT id, title, youtube_id, program, published_at, created_at FROM program_videos WHERE program = ? ORDER BY published_at DESC, created_at DESC",
            )
            .bind(program)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(
                "SELECT id, title, youtube_id, program, published_at, created_at FROM program_videos ORDER BY published_at DESC, created_at DESC",
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list program videos")?;

    Ok(rows.iter().map(row_to_video_mysql).collect())
}

fn row_to_video_mysql(row: &sqlx::mysql::MySqlRow) -> ProgramVideo {
    ProgramVideo {
        id: row.get("id"),
        title: row.get("title"),
        youtube_id: row.get("youtube_id"),
        program: row.get("program"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxProgramVideoRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxProgramVideoRepository::new(pool)
    }

    fn video(title: &str, program: &str) -> ProgramVideo {
        ProgramVideo {
            id: 0,
            title: title.to_string(),
            youtube_id: "dQw4w9WgXcQ".to_string(),
            program: program.to_string(),
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let repo = setup().await;
        repo.create(&video("Live session", "morning-show")).await.unwrap();
        repo.create(&video("Interview", "night-owls")).await.unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = repo.list(Some("morning-show")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Live session");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let v = repo.create(&video("Gone", "show")).await.unwrap();
        repo.delete(v.id).await.unwrap();
        assert!(repo.list(None).await.unwrap().is_empty());
    }
}
