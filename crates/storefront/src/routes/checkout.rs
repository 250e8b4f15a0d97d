//! Checkout handler.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use comelones_core::order::{CustomerInfo, PaymentMethod};
use comelones_core::role::{Action, UserRole};

use crate::error::Result;
use crate::middleware::{OptionalAuth, ensure};
use crate::services::CheckoutOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub customer: CustomerInfo,
    pub payment_method: PaymentMethod,
}

/// `POST /checkout` - create an order from the session cart.
///
/// Guests can fill a cart but not check out; the policy requires a
/// logged-in visitor. On success the session cart is cleared (the
/// persisted cart too, via the usual write-through).
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutOutcome>> {
    let role = user.as_ref().map_or(UserRole::Guest, |u| u.role);
    ensure(role, Action::Checkout)?;

    let view = state.cart_sync().load(&session, user.as_ref()).await?;
    let user_id = user.as_ref().map(|u| u.id.clone());

    let outcome = state
        .checkout()
        .create_order(&view.cart, body.customer, body.payment_method, user_id)
        .await?;

    // The cart served its purpose; clear it for the next visit
    state
        .cart_sync()
        .apply(&session, user.as_ref(), comelones_core::cart::CartAction::Clear)
        .await?;

    Ok(Json(outcome))
}
