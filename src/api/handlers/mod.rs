//! API request handlers.

pub mod asignaciones;
pub mod auth;
pub mod health;
pub mod users;
