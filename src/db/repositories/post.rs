//! Blog post repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Post, PostStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const POST_COLUMNS: &str = "id, slug, title, excerpt, content, content_html, cover_key, author_id, status, published_at, created_at, updated_at";

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> Result<Post>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;
    /// List posts, optionally filtered by status, newest first
    async fn list(&self, status: Option<PostStatus>, params: ListParams) -> Result<Vec<Post>>;
    /// Count posts, optionally filtered by status
    async fn count(&self, status: Option<PostStatus>) -> Result<i64>;
    async fn update(&self, post: &Post) -> Result<Post>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
        }
    }

    async fn list(&self, status: Option<PostStatus>, params: ListParams) -> Result<Vec<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), status, params).await
            }
            DatabaseDriver::Mysql => {
                list_mysql(self.pool.as_mysql().unwrap(), status, params).await
            }
        }
    }

    async fn count(&self, status: Option<PostStatus>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(self.pool.as_sqlite().unwrap(), status).await,
            DatabaseDriver::Mysql => count_mysql(self.pool.as_mysql().unwrap(), status).await,
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM posts WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to delete post")?;
                Ok(())
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM posts WHERE id = ?")
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to delete post")?;
                Ok(())
            }
        }
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO posts (slug, title, excerpt, content, content_html, cover_key, author_id, status, published_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(&post.cover_key)
    .bind(post.author_id)
    .bind(post.status.to_string())
    .bind(post.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post")?;
    row.map(|r| row_to_post_sqlite(&r)).transpose()
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by slug")?;
    row.map(|r| row_to_post_sqlite(&r)).transpose()
}

async fn list_sqlite(
    pool: &SqlitePool,
    status: Option<PostStatus>,
    params: ListParams,
) -> Result<Vec<Post>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT {} FROM posts WHERE status = ? ORDER BY published_at DESC, created_at DESC LIMIT ? OFFSET ?",
                POST_COLUMNS
            ))
            .bind(status.to_string())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM posts ORDER BY created_at DESC LIMIT ? OFFSET ?",
                POST_COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list posts")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

async fn count_sqlite(pool: &SqlitePool, status: Option<PostStatus>) -> Result<i64> {
    let count: i64 = match status {
        Some(status) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE status = ?")
                .bind(status.to_string())
                .fetch_one(pool)
                .await
        }
        None => sqlx::query_scalar("SELECT COUNT(*) FROM posts").fetch_one(pool).await,
    }
    .context("Failed to count posts")?;
    Ok(count)
}

async fn update_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE posts SET slug = ?, title = ?, excerpt = ?, content = ?, content_html = ?, cover_key = ?, status = ?, published_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(&post.cover_key)
    .bind(post.status.to_string())
    .bind(post.published_at)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_by_id_sqlite(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let status_str: String = row.get("status");
    Ok(Post {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        cover_key: row.get("cover_key"),
        author_id: row.get("author_id"),
        status: status_str.parse().unwrap_or_default(),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO posts (slug, title, excerpt, content, content_html, cover_key, author_id, status, published_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(&post.cover_key)
    .bind(post.author_id)
    .bind(post.status.to_string())
    .bind(post.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post")?;
    row.map(|r| row_to_post_mysql(&r)).transpose()
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by slug")?;
    row.map(|r| row_to_post_mysql(&r)).transpose()
}

async fn list_mysql(
    pool: &MySqlPool,
    status: Option<PostStatus>,
    params: ListParams,
) -> Result<Vec<Post>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT {} FROM posts WHERE status = ? ORDER BY published_at DESC, created_at DESC LIMIT ? OFFSET ?",
                POST_COLUMNS
            ))
            .bind(status.to_string())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM posts ORDER BY created_at DESC LIMIT ? OFFSET ?",
                POST_COLUMNS
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list posts")?;

    rows.iter().map(row_to_post_mysql).collect()
}

async fn count_mysql(pool: &MySqlPool, status: Option<PostStatus>) -> Result<i64> {
    let count: i64 = match status {
        Some(status) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE status = ?")
                .bind(status.to_string())
                .fetch_one(pool)
                .await
        }
        None => sqlx::query_scalar("SELECT COUNT(*) FROM posts").fetch_one(pool).await,
    }
    .context("Failed to count posts")?;
    Ok(count)
}

async fn update_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE posts SET slug = ?, title = ?, excerpt = ?, content = ?, content_html = ?, cover_key = ?, status = ?, published_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.content_html)
    .bind(&post.cover_key)
    .bind(post.status.to_string())
    .bind(post.published_at)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_by_id_mysql(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Post> {
    let status_str: String = row.get("status");
    Ok(Post {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        cover_key: row.get("cover_key"),
        author_id: row.get("author_id"),
        status: status_str.parse().unwrap_or_default(),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (SqlxPostRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = super::super::user::SqlxUserRepository::new(pool.clone());
        let author = crate::db::repositories::UserRepository::create(
            &user_repo,
            &User::new(
                "author@station.edu".to_string(),
                "Author".to_string(),
                "hash".to_string(),
                "editor".parse().unwrap(),
            ),
        )
        .await
        .expect("Failed to create author");

        (SqlxPostRepository::new(pool), author.id)
    }

    fn test_post(slug: &str, author_id: i64, status: PostStatus) -> Post {
        let now = Utc::now();
        Post {
            id: 0,
            slug: slug.to_string(),
            title: "Fall schedule".to_string(),
            excerpt: None,
            content: "# Hello".to_string(),
            content_html: "<h1>Hello</h1>".to_string(),
            cover_key: None,
            author_id,
            status,
            published_at: matches!(status, PostStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let (repo, author_id) = setup().await;

        let created = repo
            .create(&test_post("fall-schedule", author_id, PostStatus::Published))
            .await
            .expect("Failed to create post");
        assert!(created.id > 0);

        let found = repo
            .get_by_slug("fall-schedule")
            .await
            .expect("Failed to get post")
            .expect("Post not found");
        assert_eq!(found.title, "Fall schedule");
        assert_eq!(found.status, PostStatus::Published);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (repo, author_id) = setup().await;

        repo.create(&test_post("pub-1", author_id, PostStatus::Published))
            .await
            .unwrap();
        repo.create(&test_post("draft-1", author_id, PostStatus::Draft))
            .await
            .unwrap();

        let published = repo
            .list(Some(PostStatus::Published), ListParams::default())
            .await
            .unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "pub-1");

        let all = repo.list(None, ListParams::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        assert_eq!(repo.count(Some(PostStatus::Published)).await.unwrap(), 1);
        assert_eq!(repo.count(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let (repo, author_id) = setup().await;
        for i in 0..5 {
            repo.create(&test_post(
                &format!("post-{}", i),
                author_id,
                PostStatus::Published,
            ))
            .await
            .unwrap();
        }

        let page = repo
            .list(
                None,
                ListParams {
                    page: 2,
                    page_size: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_update_post() {
        let (repo, author_id) = setup().await;
        let mut post = repo
            .create(&test_post("update-me", author_id, PostStatus::Draft))
            .await
            .unwrap();

        post.title = "Updated".to_string();
        post.status = PostStatus::Published;
        post.published_at = Some(Utc::now());
        let updated = repo.update(&post).await.expect("Failed to update");

        assert_eq!(updated.title, "Updated");
        assert_eq!(updated.status, PostStatus::Published);
        assert!(updated.published_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_post() {
        let (repo, author_id) = setup().await;
        let post = repo
            .create(&test_post("delete-me", author_id, PostStatus::Draft))
            .await
            .unwrap();

        repo.delete(post.id).await.expect("Failed to delete");
        assert!(repo.get_by_id(post.id).await.unwrap().is_none());
    }
}
