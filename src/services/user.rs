//! User service
//!
//! Implements business logic for staff accounts:
//! - Registration, gated by the email whitelist (the first user to
//!   register is exempt and bootstraps as admin)
//! - Login/logout with DB-backed session tokens
//! - Session validation and expired-session cleanup

use crate::db::repositories::{SessionRepository, UserRepository, WhitelistRepository};
use crate::models::{RoleSet, Session, User};
use crate::services::password::{hash_password, verify_password};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email not on the whitelist
    #[error("Email is not whitelisted: {0}")]
    NotWhitelisted(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// User service for managing staff accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    whitelist_repo: Arc<dyn WhitelistRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        whitelist_repo: Arc<dyn WhitelistRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            whitelist_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Register a new staff account.
    ///
    /// The first account ever created bootstraps as admin without a
    /// whitelist check; every later registration requires the email to be
    /// whitelisted and starts with no roles until an admin assigns some.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let email = input.email.trim().to_lowercase();

        if !email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        if input.password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        if input.name.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Name must not be empty".to_string(),
            ));
        }

        let is_first = self.user_repo.count().await? == 0;

        if !is_first && !self.whitelist_repo.contains(&email).await? {
            return Err(UserServiceError::NotWhitelisted(email));
        }

        if self.user_repo.get_by_email(&email).await?.is_some() {
            return Err(UserServiceError::UserExists(email));
        }

        let roles: RoleSet = if is_first {
            "admin".parse().unwrap_or_default()
        } else {
            RoleSet::default()
        };

        let password_hash = hash_password(&input.password)?;
        let user = User::new(email, input.name.trim().to_string(), password_hash, roles);

        let created = self.user_repo.create(&user).await?;
        tracing::info!(user_id = created.id, email = %created.email, "User registered");
        Ok(created)
    }

    /// Authenticate and create a session.
    ///
    /// Besides the password check, the email must still be on the
    /// whitelist (unless the user is an admin): removing an email from
    /// the whitelist locks the account out at the next sign-in.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let email = input.email.trim().to_lowercase();

        let user = self
            .user_repo
            .get_by_email(&email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid email or password".to_string())
            })?;

        let valid = verify_password(&input.password, &user.password_hash)?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid email or password".to_string(),
            ));
        }

        if !user.is_admin() && !self.whitelist_repo.contains(&email).await? {
            return Err(UserServiceError::NotWhitelisted(email));
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self.session_repo.create(&session).await?;
        tracing::debug!(user_id = user.id, "Session created");
        Ok(created)
    }

    /// Delete a session (logout)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo.delete(session_id).await?;
        Ok(())
    }

    /// Validate a session token and return the associated user.
    ///
    /// Returns `Ok(None)` for unknown or expired tokens; an expired
    /// session is deleted as a side effect.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self.session_repo.get_by_id(token).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo.delete(&session.id).await?;
            return Ok(None);
        }

        Ok(self.user_repo.get_by_id(session.user_id).await?)
    }

    /// Delete all expired sessions, returning the number removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        Ok(self.session_repo.delete_expired().await?)
    }
}
