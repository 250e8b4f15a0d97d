//! Database migration command.
//!
//! Runs the storefront migrations from `crates/storefront/migrations/`
//! and then lets the session store create its own table. Migrations
//! are embedded at compile time, so the binary is self-contained.

use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use super::{CliError, database_url};

/// Run all database migrations.
///
/// # Errors
///
/// Returns `CliError` if the connection or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(&url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
