//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check
//! GET    /health/ready              - Readiness check (pings PostgreSQL)
//!
//! # Catalog
//! GET    /products                  - Product listing
//!
//! # Cart (session-scoped)
//! GET    /cart                      - Current cart, reconciled against the catalog
//! POST   /cart/items                - Add one unit of a product
//! PATCH  /cart/items/{id}           - Set a line quantity (<= 0 removes)
//! DELETE /cart/items/{id}           - Remove a line
//! DELETE /cart                      - Clear the cart
//! POST   /cart/sync                 - Push the session cart to PostgreSQL
//!
//! # Auth (identity provider has already verified the profile)
//! POST   /auth/session              - Establish a session, merge carts
//! DELETE /auth/session              - Logout, reset the session cart
//!
//! # Checkout and orders
//! POST   /checkout                  - Create an order from the cart
//! GET    /orders                    - List own orders (admins: all, with filters)
//! GET    /orders/{id}               - Order detail (owner or admin)
//! POST   /orders/{id}/receipt       - Upload a bank-transfer receipt
//!
//! # Admin
//! POST   /admin/orders/{id}/review  - Approve or reject a receipt
//! POST   /admin/orders/{id}/status  - Force a terminal status
//! DELETE /admin/orders/{id}         - Delete an order
//!
//! # Webhooks
//! POST   /webhooks/nequi            - Gateway payment confirmation
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
};

use crate::services::receipts::MAX_RECEIPT_BYTES;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            patch(cart::update_quantity).delete(cart::remove_item),
        )
        .route("/sync", post(cart::sync))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/session", post(auth::login).delete(auth::logout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route(
            "/{id}/receipt",
            // axum's default body limit (2 MB) is smaller than the
            // receipt cap; leave headroom for multipart framing
            post(orders::upload_receipt)
                .layer(DefaultBodyLimit::max(MAX_RECEIPT_BYTES + 64 * 1024)),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/review", post(admin::review_receipt))
        .route("/orders/{id}/status", post(admin::override_status))
        .route("/orders/{id}", delete(admin::delete_order))
}

/// Create the full application router (without middleware layers).
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/checkout", post(checkout::create))
        .route("/webhooks/nequi", post(webhooks::nequi_callback))
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
}
