//! User management handlers.
//!
//! All routes here are admin-only except `/search`, which any authenticated
//! user may call to pick assignees.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::dto::{ListQuery, Paginated};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::user::{PublicUser, Role};
use crate::services::auth_service::NewUser;
use crate::services::user_service::{UserSearchResult, UserUpdate};

const MAX_PAGE_SIZE: u32 = 20;
const MIN_SEARCH_LEN: usize = 2;

/// Admin-only user management routes
pub fn admin_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// Routes available to any authenticated user
pub fn protected_router() -> Router<SharedState> {
    Router::new().route("/search", get(search_users))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// List users (paginated)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListQuery),
    responses((status = 200, description = "User list", body = Paginated<PublicUser>)),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<PublicUser>>> {
    let page = query.page();
    let limit = query.limit(10, MAX_PAGE_SIZE);
    let (users, total) = state.user_service().list(page, limit).await?;
    Ok(Json(Paginated::new(users, total, page, limit)))
}

/// Create a user with an explicit role
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = PublicUser),
        (status = 400, description = "Invalid user data"),
        (status = 409, description = "Email already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<SharedState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    if payload.full_name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.phone.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Full name, email and phone are required".to_string(),
        ));
    }
    if payload.password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let user = state
        .auth_service()
        .register(NewUser {
            full_name: payload.full_name,
            email: payload.email,
            phone: payload.phone,
            password: payload.password,
            role: payload.role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a single user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = PublicUser),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>> {
    let user = state.user_service().get(id).await?;
    Ok(Json(user))
}

/// Update a user; omitted fields keep their stored value
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = PublicUser),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>> {
    if let Some(password) = payload.password.as_deref() {
        if password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }
    }

    let user = state
        .user_service()
        .update(
            id,
            UserUpdate {
                full_name: payload.full_name,
                email: payload.email,
                phone: payload.phone,
                password: payload.password,
                role: payload.role,
            },
        )
        .await?;
    Ok(Json(user))
}

/// Delete a user. Admins cannot delete their own account.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete own account"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if auth.user_id == id {
        return Err(AppError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }

    state.user_service().delete(id).await?;
    Ok(StatusCode::OK)
}

/// Search users by name or email. Queries shorter than two characters
/// return an empty page rather than scanning the whole directory.
#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    params(SearchQuery),
    responses((status = 200, description = "Matching users", body = Paginated<UserSearchResult>)),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn search_users(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paginated<UserSearchResult>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE);

    let q = query.q.as_deref().map(str::trim).unwrap_or("");
    if q.chars().count() < MIN_SEARCH_LEN {
        return Ok(Json(Paginated::new(vec![], 0, 1, limit)));
    }

    let (users, total) = state.user_service().search(q, page, limit).await?;
    Ok(Json(Paginated::new(users, total, page, limit)))
}

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
        search_users
    ),
    components(schemas(CreateUserRequest, UpdateUserRequest, PublicUser, UserSearchResult, Role))
)]
pub struct UsersApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_all_fields_optional() {
        let payload: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(payload.full_name.is_none());
        assert!(payload.role.is_none());
    }

    #[test]
    fn test_update_request_camel_case_fields() {
        let payload: UpdateUserRequest =
            serde_json::from_str(r#"{"fullName": "Ana", "role": "admin"}"#).unwrap();
        assert_eq!(payload.full_name.as_deref(), Some("Ana"));
        assert_eq!(payload.role, Some(Role::Admin));
    }

    #[test]
    fn test_create_request_requires_role() {
        let result: std::result::Result<CreateUserRequest, _> = serde_json::from_str(
            r#"{"fullName": "Ana", "email": "a@b.c", "phone": "1", "password": "secret1"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_create_request_rejects_unknown_role() {
        let result: std::result::Result<CreateUserRequest, _> = serde_json::from_str(
            r#"{"fullName": "Ana", "email": "a@b.c", "phone": "1",
                "password": "secret1", "role": "superuser"}"#,
        );
        assert!(result.is_err());
    }
}
