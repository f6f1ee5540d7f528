//! User management service.
//!
//! Admin-facing CRUD over the user store plus the directory search every
//! authenticated user may run when picking assignees.

use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::user::{PublicUser, Role};
use crate::services::auth_service::AuthService;

const PUBLIC_COLUMNS: &str = "id, full_name, email, phone, role, created_at, updated_at";

/// Search hit for the assignee picker.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

/// Partial update: only supplied fields change. A supplied password is
/// re-hashed; the stored hash is otherwise untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Service for managing users.
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Paginated user list, newest first.
    pub async fn list(&self, page: u32, limit: u32) -> Result<(Vec<PublicUser>, i64)> {
        let offset = (i64::from(page.max(1)) - 1) * i64::from(limit);

        let users = sqlx::query_as::<_, PublicUser>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users ORDER BY created_at DESC OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;

        Ok((users, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<PublicUser> {
        sqlx::query_as::<_, PublicUser>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Case-insensitive name/email search for assignee pickers, paginated.
    /// The handler enforces the minimum query length; this just runs the
    /// match.
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<UserSearchResult>, i64)> {
        let pattern = format!("%{}%", query);
        let offset = (i64::from(page.max(1)) - 1) * i64::from(limit);

        let users = sqlx::query_as::<_, UserSearchResult>(
            "SELECT id, full_name, email, phone FROM users
             WHERE full_name ILIKE $1 OR email ILIKE $1
             ORDER BY full_name, email
             OFFSET $2 LIMIT $3",
        )
        .bind(&pattern)
        .bind(offset)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE full_name ILIKE $1 OR email ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        Ok((users, total))
    }

    /// Apply a partial update. `NotFound` when the user does not exist,
    /// `Conflict` when the new email is already taken.
    pub async fn update(&self, id: Uuid, update: UserUpdate) -> Result<PublicUser> {
        // COALESCE keeps the stored value for fields the caller omitted.
        let password_hash = match update.password.as_deref() {
            Some(pw) => Some(AuthService::hash_password(pw)?),
            None => None,
        };

        sqlx::query_as::<_, PublicUser>(&format!(
            "UPDATE users SET
                 full_name = COALESCE($2, full_name),
                 email = COALESCE($3, email),
                 phone = COALESCE($4, phone),
                 password_hash = COALESCE($5, password_hash),
                 role = COALESCE($6, role),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {PUBLIC_COLUMNS}"
        ))
        .bind(id)
        .bind(update.full_name.as_deref().map(str::trim))
        .bind(update.email.as_deref().map(str::trim))
        .bind(update.phone.as_deref().map(str::trim))
        .bind(&password_hash)
        .bind(update.role)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if e.to_string().contains("duplicate key") {
                AppError::Conflict("Email already in use".to_string())
            } else {
                AppError::Database(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Delete a user. Assignment references to this user null out at the
    /// store level; assignments themselves are never touched.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
