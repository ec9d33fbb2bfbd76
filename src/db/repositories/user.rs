//! User repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{RoleSet, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email (case-insensitive)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List all users
    async fn list(&self) -> Result<Vec<User>>;

    /// Update a user's role string
    async fn update_roles(&self, id: i64, roles: &RoleSet) -> Result<()>;

    /// Total number of users
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_email_sqlite(self.pool.as_sqlite().unwrap(), &email).await
            }
            DatabaseDriver::Mysql => {
                get_by_email_mysql(self.pool.as_mysql().unwrap(), &email).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update_roles(&self, id: i64, roles: &RoleSet) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_roles_sqlite(self.pool.as_sqlite().unwrap(), id, roles).await
            }
            DatabaseDriver::Mysql => {
                update_roles_mysql(self.pool.as_mysql().unwrap(), id, roles).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to count users")?;
                Ok(count)
            }
            DatabaseDriver::Mysql => {
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to count users")?;
                Ok(count)
            }
        }
    }
}

// SQLite implementations

async fn create_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users (email, name, password_hash, roles, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.email.to_lowercase())
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.roles.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        email: user.email.to_lowercase(),
        name: user.name.clone(),
        password_hash: user.password_hash.clone(),
        roles: user.roles.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, name, password_hash, roles, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user")?;
    Ok(row.map(|r| row_to_user_sqlite(&r)).transpose()?)
}

async fn get_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, name, password_hash, roles, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;
    Ok(row.map(|r| row_to_user_sqlite(&r)).transpose()?)
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        "SELECT id, email, name, password_hash, roles, created_at, updated_at FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list users")?;
    rows.iter().map(row_to_user_sqlite).collect()
}

async fn update_roles_sqlite(pool: &SqlitePool, id: i64, roles: &RoleSet) -> Result<()> {
    sqlx::query("UPDATE users SET roles = ?, updated_at = ? WHERE id = ?")
        .bind(roles.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user roles")?;
    Ok(())
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let roles_str: String = row.get("roles");
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        roles: roles_str.parse().unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// MySQL implementations

async fn create_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users (email, name, password_hash, roles, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.email.to_lowercase())
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.roles.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        email: user.email.to_lowercase(),
        name: user.name.clone(),
        password_hash: user.password_hash.clone(),
        roles: user.roles.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, name, password_hash, roles, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user")?;
    Ok(row.map(|r| row_to_user_mysql(&r)).transpose()?)
}

async fn get_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, name, password_hash, roles, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;
    Ok(row.map(|r| row_to_user_mysql(&r)).transpose()?)
}

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        "SELECT id, email, name, password_hash, roles, created_at, updated_at FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list users")?;
    rows.iter().map(row_to_user_mysql).collect()
}

async fn update_roles_mysql(pool: &MySqlPool, id: i64, roles: &RoleSet) -> Result<()> {
    sqlx::query("UPDATE users SET roles = ?, updated_at = ? WHERE id = ?")
        .bind(roles.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user roles")?;
    Ok(())
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let roles_str: String = row.get("roles");
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        roles: roles_str.parse().unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxUserRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxUserRepository::new(pool)
    }

    fn test_user(email: &str, roles: &str) -> User {
        User::new(
            email.to_string(),
            "Test User".to_string(),
            "hash".to_string(),
            roles.parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup().await;

        let created = repo
            .create(&test_user("dj@station.edu", "dj"))
            .await
            .expect("Failed to create user");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.email, "dj@station.edu");
        assert!(found.roles.contains("dj"));
    }

    #[tokio::test]
    async fn test_get_by_email_is_case_insensitive() {
        let repo = setup().await;
        repo.create(&test_user("Mixed@Station.EDU", "editor"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_email("mixed@station.edu")
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.email, "mixed@station.edu");

        let found = repo
            .get_by_email("MIXED@station.edu")
            .await
            .expect("Failed to get user");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_update_roles() {
        let repo = setup().await;
        let user = repo
            .create(&test_user("u@station.edu", "dj"))
            .await
            .unwrap();

        repo.update_roles(user.id, &"admin-editor".parse().unwrap())
            .await
            .expect("Failed to update roles");

        let updated = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(updated.roles.contains("admin"));
        assert!(updated.roles.contains("editor"));
        assert!(!updated.roles.contains("dj"));
    }

    #[tokio::test]
    async fn test_count() {
        let repo = setup().await;
        assert_eq!(repo.count().await.unwrap(), 0);
        repo.create(&test_user("a@station.edu", "")).await.unwrap();
        repo.create(&test_user("b@station.edu", "")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = setup().await;
        repo.create(&test_user("dup@station.edu", "")).await.unwrap();
        let result = repo.create(&test_user("dup@station.edu", "")).await;
        assert!(result.is_err());
    }
}
