//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum size of the database connection pool
    pub database_max_connections: u32,

    /// Server bind address (host:port)
    pub bind_address: String,

    /// Secret key for signing access tokens
    pub jwt_access_secret: String,

    /// Secret key for signing refresh tokens. Independent of the access
    /// secret so one class of token can never verify as the other.
    pub jwt_refresh_secret: String,

    /// Access token expiry in minutes
    pub jwt_access_token_expiry_minutes: i64,

    /// Refresh token expiry in days
    pub jwt_refresh_token_expiry_days: i64,

    /// Whether the refresh token cookie carries the Secure attribute
    pub cookie_secure: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL not set".into()))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            jwt_access_secret: env::var("JWT_ACCESS_SECRET")
                .map_err(|_| AppError::Config("JWT_ACCESS_SECRET not set".into()))?,
            jwt_refresh_secret: env::var("JWT_REFRESH_SECRET")
                .map_err(|_| AppError::Config("JWT_REFRESH_SECRET not set".into()))?,
            jwt_access_token_expiry_minutes: env::var("JWT_ACCESS_TOKEN_EXPIRY_MINUTES")
                .unwrap_or_else(|_| "15".into())
                .parse()
                .unwrap_or(15),
            jwt_refresh_token_expiry_days: env::var("JWT_REFRESH_TOKEN_EXPIRY_DAYS")
                .unwrap_or_else(|_| "7".into())
                .parse()
                .unwrap_or(7),
            cookie_secure: env::var("COOKIE_SECURE")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_applies_defaults() {
        env::set_var("DATABASE_URL", "postgres://localhost/config_test");
        env::set_var("JWT_ACCESS_SECRET", "access");
        env::set_var("JWT_REFRESH_SECRET", "refresh");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.jwt_access_token_expiry_minutes, 15);
        assert_eq!(config.jwt_refresh_token_expiry_days, 7);
    }
}
