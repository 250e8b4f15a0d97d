//! Cart route handlers.
//!
//! Every handler reads and writes the session cart through `CartSync`,
//! so guests and authenticated users share one code path. Responses
//! carry the full cart plus a `sync_error` field when a write-through
//! to `PostgreSQL` failed.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use comelones_core::ProductId;
use comelones_core::cart::{CartAction, ProductRef};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::services::CartView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// `GET /cart` - the current session cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    let view = state.cart_sync().load(&session, user.as_ref()).await?;
    Ok(Json(view))
}

/// `POST /cart/items` - add one unit of a product.
///
/// The price and name are looked up server-side; the client only names
/// the product.
#[instrument(skip_all)]
pub async fn add_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product = state
        .catalog()
        .get(&body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;

    let action = CartAction::AddItem {
        product: ProductRef {
            id: product.id,
            name: product.name,
            price: product.price,
        },
    };

    let view = state
        .cart_sync()
        .apply(&session, user.as_ref(), action)
        .await?;
    Ok(Json(view))
}

/// `PATCH /cart/items/{id}` - set a line quantity absolutely.
///
/// A quantity of zero or less removes the line.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn update_quantity(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let action = CartAction::UpdateQuantity {
        id,
        quantity: body.quantity,
    };

    let view = state
        .cart_sync()
        .apply(&session, user.as_ref(), action)
        .await?;
    Ok(Json(view))
}

/// `DELETE /cart/items/{id}` - remove a line.
///
/// Removing a product that is not in the cart is a silent no-op.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn remove_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let view = state
        .cart_sync()
        .apply(&session, user.as_ref(), CartAction::RemoveItem { id })
        .await?;
    Ok(Json(view))
}

/// `DELETE /cart` - clear the cart.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    let view = state
        .cart_sync()
        .apply(&session, user.as_ref(), CartAction::Clear)
        .await?;
    Ok(Json(view))
}

/// `POST /cart/sync` - push the session cart to `PostgreSQL`.
///
/// The manual recovery path after a reported `sync_error`. Requires a
/// logged-in user; a guest cart has no persisted copy to sync.
#[instrument(skip_all)]
pub async fn sync(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Json<CartView>> {
    let user =
        user.ok_or_else(|| AppError::Unauthorized("login required to sync".to_string()))?;
    let view = state.cart_sync().resync(&session, &user).await?;
    Ok(Json(view))
}
