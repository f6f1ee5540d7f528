//! API module - HTTP handlers and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::asignacion_service::AsignacionService;
use crate::services::auth_service::AuthService;
use crate::services::token_service::TokenService;
use crate::services::user_service::UserService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: Config, db: PgPool) -> Self {
        let tokens = TokenService::new(&config);
        Self { config, db, tokens }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.tokens.clone())
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.db.clone())
    }

    pub fn asignacion_service(&self) -> AsignacionService {
        AsignacionService::new(self.db.clone())
    }
}

pub type SharedState = Arc<AppState>;
