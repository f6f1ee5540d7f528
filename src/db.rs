//! Database connection pool setup.

use crate::config::Config;
use crate::error::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create the application connection pool. This service handles short
/// request-scoped queries only, so the pool stays small; the ceiling is
/// tunable via `DATABASE_MAX_CONNECTIONS` for larger deployments.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .connect(&config.database_url)
        .await?;

    Ok(pool)
}
