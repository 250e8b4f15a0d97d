//! Domain models for the storefront.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comelones_core::role::UserRole;
use comelones_core::{Email, ProductId, UserId};

/// Session storage keys.
pub mod session_keys {
    /// The authenticated user, set by `POST /auth/session`.
    pub const CURRENT_USER: &str = "current_user";
    /// The session-local cart (authoritative for guests, a mirror of the
    /// persisted cart for authenticated users).
    pub const CART: &str = "cart";
}

/// The authenticated identity stored in the session.
///
/// The identity provider has already verified this profile; the
/// storefront consumes it as-is and attaches the authoritative role
/// resolved from the configured role directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub role: UserRole,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in COP.
    pub price: Decimal,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
