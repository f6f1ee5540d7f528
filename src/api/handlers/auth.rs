//! Authentication handlers.
//!
//! The refresh token rides in an HttpOnly cookie; only the access token and
//! the user projection appear in response bodies.

use axum::{
    extract::{Extension, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::user::{PublicUser, Role};
use crate::services::auth_service::NewUser;

const REFRESH_COOKIE: &str = "refreshToken";

/// Create public auth routes (no auth required)
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
}

/// Create protected auth routes (auth required)
pub fn protected_router() -> Router<SharedState> {
    Router::new().route("/me", get(get_current_user))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Serialize the refresh cookie. HttpOnly and SameSite=Strict keep it out of
/// scripts and cross-site requests.
fn refresh_cookie_value(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{REFRESH_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// An expired, empty cookie; setting it is how the browser copy is removed.
fn clear_cookie_value(secure: bool) -> String {
    refresh_cookie_value("", 0, secure)
}

/// Pull the refresh token out of the Cookie request header.
fn refresh_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        (name == REFRESH_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

fn with_refresh_cookie(mut response: Response, cookie: &str) -> Result<Response> {
    let value = cookie
        .parse()
        .map_err(|_| AppError::Internal("Invalid cookie value".to_string()))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(response)
}

/// Register a new account. Public registration always creates a viewer;
/// admin accounts come from the user management endpoints.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = PublicUser),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    if payload.full_name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.phone.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Full name, email and phone are required".to_string(),
        ));
    }
    if !payload.email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
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
            role: Role::Viewer,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with credentials
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    let (user, pair) = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    let cookie = refresh_cookie_value(
        &pair.refresh_token,
        state.tokens.refresh_max_age_secs(),
        state.config.cookie_secure,
    );
    let response = Json(LoginResponse {
        access_token: pair.access_token,
        user,
    })
    .into_response();

    with_refresh_cookie(response, &cookie)
}

/// Rotate the session: a valid refresh cookie yields a fresh access token
/// and a replacement cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Missing or invalid refresh token"),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response> {
    let token = refresh_token_from_headers(&headers)
        .ok_or_else(|| AppError::Authentication("No refresh token provided".to_string()))?;

    let (_user, pair) = state.auth_service().refresh(&token).await?;

    let cookie = refresh_cookie_value(
        &pair.refresh_token,
        state.tokens.refresh_max_age_secs(),
        state.config.cookie_secure,
    );
    let response = Json(RefreshResponse {
        access_token: pair.access_token,
    })
    .into_response();

    with_refresh_cookie(response, &cookie)
}

/// Logout current session. Always succeeds; the cookie is cleared whether or
/// not the token was still valid.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Session closed", body = MessageResponse)),
    tag = "auth"
)]
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Result<Response> {
    if let Some(token) = refresh_token_from_headers(&headers) {
        state.auth_service().logout(&token).await?;
    }

    let response = Json(MessageResponse {
        message: "Logged out".to_string(),
    })
    .into_response();

    with_refresh_cookie(response, &clear_cookie_value(state.config.cookie_secure))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<PublicUser>> {
    let user = state.auth_service().current_user(auth.user_id).await?;
    Ok(Json(user))
}

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(register, login, refresh_token, logout, get_current_user),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        RefreshResponse,
        MessageResponse,
        PublicUser
    ))
)]
pub struct AuthApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie_value("tok123", 604800, true);
        assert!(cookie.starts_with("refreshToken=tok123;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn test_refresh_cookie_insecure_mode() {
        let cookie = refresh_cookie_value("tok123", 604800, false);
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_cookie_value(true);
        assert!(cookie.starts_with("refreshToken=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_refresh_token_from_single_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "refreshToken=abc.def.ghi".parse().unwrap());
        assert_eq!(
            refresh_token_from_headers(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_refresh_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "theme=dark; refreshToken=tok; lang=es".parse().unwrap(),
        );
        assert_eq!(refresh_token_from_headers(&headers).as_deref(), Some("tok"));
    }

    #[test]
    fn test_missing_cookie_header() {
        let headers = HeaderMap::new();
        assert!(refresh_token_from_headers(&headers).is_none());
    }

    #[test]
    fn test_empty_refresh_cookie_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "refreshToken=".parse().unwrap());
        assert!(refresh_token_from_headers(&headers).is_none());
    }

    #[test]
    fn test_unrelated_cookies_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "session=xyz; theme=dark".parse().unwrap());
        assert!(refresh_token_from_headers(&headers).is_none());
    }

    #[test]
    fn test_login_response_wire_shape() {
        use chrono::Utc;
        use uuid::Uuid;

        let now = Utc::now();
        let response = LoginResponse {
            access_token: "jwt".to_string(),
            user: PublicUser {
                id: Uuid::nil(),
                full_name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                phone: "123".to_string(),
                role: Role::Viewer,
                created_at: now,
                updated_at: now,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "jwt");
        assert_eq!(json["user"]["fullName"], "Ana");
        assert!(json.get("refreshToken").is_none());
    }
}
