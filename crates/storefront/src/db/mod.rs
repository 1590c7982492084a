//! `PostgreSQL` connection and schema management.
//!
//! # Tables
//!
//! - `storefront.document` - all document-store collections (`medicines`,
//!   `orders`, `users`)
//! - `storefront.identity` - email/password accounts
//! - `tower_sessions.session` - HTTP sessions (created by the session store)
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and are run explicitly:
//! ```bash
//! devgon-cli migrate
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors from schema migration.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("storefront migration failed: {0}")]
    Schema(#[from] sqlx::migrate::MigrateError),

    #[error("session table migration failed: {0}")]
    Sessions(#[from] sqlx::Error),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply the storefront schema and the session table.
///
/// # Errors
///
/// Returns `MigrationError` if either migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrationError> {
    tracing::info!("Running storefront migrations");
    sqlx::migrate!("./migrations").run(pool).await?;

    tracing::info!("Creating session table");
    PostgresStore::new(pool.clone()).migrate().await?;

    Ok(())
}
