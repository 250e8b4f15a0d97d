//! Integration tests for ComelonesFit.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and run migrations
//! cargo run -p comelones-cli -- migrate
//!
//! # Start the storefront
//! cargo run -p comelones-storefront
//!
//! # Run the ignored HTTP tests
//! cargo test -p comelones-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_flow` - Session cart mutations and reconciliation
//! - `checkout_flow` - Checkout, receipts, and gateway callbacks
//! - `admin_orders` - Admin review, override, and delete

use reqwest::Client;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Create an HTTP client with a cookie store, so the tower-sessions
/// cookie persists across requests within one test.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
