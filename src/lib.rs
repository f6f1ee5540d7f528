//! Asignaciones - Backend Library
//!
//! Scheduling service for recurring meeting assignments with role-based
//! user management and JWT authentication with refresh rotation.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
