//! Business logic services.

pub mod asignacion_service;
pub mod auth_service;
pub mod token_service;
pub mod user_service;
