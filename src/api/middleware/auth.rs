//! Authentication middleware.
//!
//! Extracts and validates the JWT access token from requests.
//!
//! Only `Authorization: Bearer <jwt>` is accepted; the refresh token never
//! authorizes a request directly, it only drives the refresh endpoint.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::models::user::Role;
use crate::services::token_service::{AccessClaims, TokenService};

/// Extension that holds authenticated user information
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<AccessClaims> for AuthExtension {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// Token extraction result
#[derive(Debug)]
enum ExtractedToken<'a> {
    Bearer(&'a str),
    /// No Authorization header
    None,
    /// Header present but not a Bearer credential
    Invalid,
}

fn extract_token(request: &Request) -> ExtractedToken<'_> {
    match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) => ExtractedToken::Bearer(token),
            None => ExtractedToken::Invalid,
        },
        None => ExtractedToken::None,
    }
}

/// Authentication middleware function - requires a valid access token
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match extract_token(&request) {
        ExtractedToken::Bearer(token) => match tokens.verify_access_token(token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthExtension::from(claims));
                next.run(request).await
            }
            Err(_) => (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response(),
        },
        ExtractedToken::None => {
            (StatusCode::UNAUTHORIZED, "Missing authorization header").into_response()
        }
        ExtractedToken::Invalid => {
            (StatusCode::UNAUTHORIZED, "Invalid authorization header format").into_response()
        }
    }
}

/// Admin-only middleware - requires an authenticated admin user
pub async fn admin_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_ext = match extract_token(&request) {
        ExtractedToken::Bearer(token) => match tokens.verify_access_token(token) {
            Ok(claims) => AuthExtension::from(claims),
            Err(_) => {
                return (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response();
            }
        },
        ExtractedToken::None => {
            return (StatusCode::UNAUTHORIZED, "Missing authorization header").into_response();
        }
        ExtractedToken::Invalid => {
            return (StatusCode::UNAUTHORIZED, "Invalid authorization header format")
                .into_response();
        }
    };

    if auth_ext.role != Role::Admin {
        return (StatusCode::FORBIDDEN, "Admin access required").into_response();
    }

    request.extensions_mut().insert(auth_ext);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let req = request_with_auth(Some("Bearer abc.def.ghi"));
        assert!(matches!(
            extract_token(&req),
            ExtractedToken::Bearer("abc.def.ghi")
        ));
    }

    #[test]
    fn test_missing_header_is_none() {
        let req = request_with_auth(None);
        assert!(matches!(extract_token(&req), ExtractedToken::None));
    }

    #[test]
    fn test_non_bearer_scheme_is_invalid() {
        let req = request_with_auth(Some("Basic dXNlcjpwdw=="));
        assert!(matches!(extract_token(&req), ExtractedToken::Invalid));
    }
}
