//! Authentication service.
//!
//! Implements the session lifecycle over the credential store: login,
//! refresh-with-rotation, logout and user registration. Exactly one refresh
//! token is valid per user at a time; every login and refresh overwrites the
//! stored token, and the new token is persisted before it is handed to the
//! caller.

use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::user::{PublicUser, Role, User};
use crate::services::token_service::{TokenPair, TokenService};

const USER_COLUMNS: &str =
    "id, full_name, email, phone, password_hash, role, refresh_token, created_at, updated_at";

/// New user registration data. The public register endpoint builds this with
/// `Role::Viewer`; only the admin create-user endpoint chooses the role.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Role,
}

/// Authentication service
pub struct AuthService {
    db: PgPool,
    tokens: TokenService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(db: PgPool, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    /// Authenticate with email and password.
    ///
    /// Email is unique at the store level, so the lookup is by key. Unknown
    /// email and wrong password produce the identical error to avoid
    /// account enumeration.
    pub async fn login(&self, email: &str, password: &str) -> Result<(PublicUser, TokenPair)> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !Self::verify_password(password, &user.password_hash)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let pair = self.tokens.issue_pair(user.id, user.role)?;
        self.store_refresh_token(user.id, Some(&pair.refresh_token))
            .await?;

        Ok((user.into(), pair))
    }

    /// Rotate tokens using a refresh token.
    ///
    /// The presented token must verify cryptographically AND exactly match
    /// the token currently stored for the user; a stale or already-rotated
    /// token fails even when unexpired.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(PublicUser, TokenPair)> {
        let claims = self.tokens.verify_refresh_token(refresh_token)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(claims.sub)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid refresh token".to_string()))?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AppError::Authentication(
                "Invalid refresh token".to_string(),
            ));
        }

        let pair = self.tokens.issue_pair(user.id, user.role)?;
        self.store_refresh_token(user.id, Some(&pair.refresh_token))
            .await?;

        Ok((user.into(), pair))
    }

    /// Invalidate the stored refresh token. Best-effort and idempotent: an
    /// invalid, expired or already-cleared token is not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        if let Ok(claims) = self.tokens.verify_refresh_token(refresh_token) {
            self.store_refresh_token(claims.sub, None).await?;
        }
        Ok(())
    }

    /// Fetch the current public user projection, fresh from the store so
    /// role/name changes apply without waiting for token expiry.
    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser> {
        sqlx::query_as::<_, PublicUser>(
            "SELECT id, full_name, email, phone, role, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Create a user. Duplicate email maps to `Conflict`.
    pub async fn register(&self, new_user: NewUser) -> Result<PublicUser> {
        let password_hash = Self::hash_password(&new_user.password)?;

        sqlx::query_as::<_, PublicUser>(
            "INSERT INTO users (full_name, email, phone, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, full_name, email, phone, role, created_at, updated_at",
        )
        .bind(new_user.full_name.trim())
        .bind(new_user.email.trim())
        .bind(new_user.phone.trim())
        .bind(&password_hash)
        .bind(new_user.role)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if e.to_string().contains("duplicate key") {
                AppError::Conflict("User already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })
    }

    /// Full overwrite of the stored refresh token (or clear with `None`).
    async fn store_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Hash a password
    pub fn hash_password(password: &str) -> Result<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}
