//! Route definitions for the API.

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers;
use super::middleware::auth::{admin_middleware, auth_middleware};
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    // Build OpenAPI spec once at startup
    let openapi = super::openapi::build_openapi();

    Router::new()
        // Health endpoints (no auth required)
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // OpenAPI spec (served by SwaggerUi at /api/v1/openapi.json) and Swagger UI
        .merge(SwaggerUi::new("/docs").url("/api/v1/openapi.json", openapi))
        // API v1 routes
        .nest("/api/v1", api_v1_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: SharedState) -> Router<SharedState> {
    // The token verifier is all the middleware needs; handlers resolve the
    // user from the store themselves.
    let tokens = Arc::new(state.tokens.clone());

    Router::new()
        // Auth routes - split into public and protected
        .nest("/auth", handlers::auth::public_router())
        .nest(
            "/auth",
            handlers::auth::protected_router().layer(middleware::from_fn_with_state(
                tokens.clone(),
                auth_middleware,
            )),
        )
        // Assignee search is open to any authenticated user, unlike the
        // rest of /users.
        .nest(
            "/users",
            handlers::users::protected_router().layer(middleware::from_fn_with_state(
                tokens.clone(),
                auth_middleware,
            )),
        )
        // User management routes require admin privileges
        .nest(
            "/users",
            handlers::users::admin_router().layer(middleware::from_fn_with_state(
                tokens.clone(),
                admin_middleware,
            )),
        )
        // Assignment routes for any authenticated user
        .nest(
            "/asignaciones",
            handlers::asignaciones::router().layer(middleware::from_fn_with_state(
                tokens.clone(),
                auth_middleware,
            )),
        )
}
