//! Database operations for the storefront `PostgreSQL` instance.
//!
//! The external document-store contract is narrow: get-by-id, filtered
//! queries with ordering and limit, insert, update-merge, delete. Each
//! collection gets a repository:
//!
//! ## Tables
//!
//! - `storefront_user` - Users with their authoritative role
//! - `cart` - One persisted cart document per user (items as JSONB)
//! - `product_order` - Immutable order records (line items as JSONB)
//! - `product` - Product catalog
//! - `tower_sessions.session` - Session storage (guest carts live here)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p comelones-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod carts;
pub mod orders;
pub mod products;
pub mod users;

pub use carts::CartRepository;
pub use orders::{OrderFilter, OrderRepository, StatusMetric};
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or a lost concurrent race.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
