use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

pub mod models;

/// Connect the process-wide pool. Gates and controllers borrow a connection,
/// issue one statement or a small fixed sequence, and return it on all paths.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
}

/// Build the pool without an eager connection attempt. Used by tests that
/// exercise routes which never reach the database.
pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_lazy(&config.url)
}

/// Liveness check used by the health endpoint.
pub async fn health_check(pool: &PgPool) -> Result<chrono::DateTime<chrono::Utc>, sqlx::Error> {
    let row: (chrono::DateTime<chrono::Utc>,) = sqlx::query_as("SELECT NOW()").fetch_one(pool).await?;
    Ok(row.0)
}
