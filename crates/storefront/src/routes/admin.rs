//! Admin order handlers.
//!
//! Each handler gates on the capability policy, not on the role name,
//! so granting a capability to a new role never touches this module.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use comelones_core::OrderId;
use comelones_core::order::OrderStatus;
use comelones_core::role::Action;

use crate::error::Result;
use crate::middleware::{RequireAuth, ensure};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// `POST /admin/orders/{id}/review` - approve or reject a receipt.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn review_receipt(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<StatusResponse>> {
    ensure(user.role, Action::ReviewReceipts)?;

    let status = state.checkout().review_receipt(&id, body.approved).await?;
    Ok(Json(StatusResponse {
        order_id: id,
        status,
    }))
}

/// `POST /admin/orders/{id}/status` - force a terminal status.
///
/// The escape hatch for orders stuck by gateway outages or lost
/// callbacks. Only the terminal statuses are valid targets.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn override_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(body): Json<OverrideRequest>,
) -> Result<Json<StatusResponse>> {
    ensure(user.role, Action::OverrideOrderStatus)?;

    let status = state.checkout().override_status(&id, body.status).await?;
    Ok(Json(StatusResponse {
        order_id: id,
        status,
    }))
}

/// `DELETE /admin/orders/{id}` - delete an order outright.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn delete_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<serde_json::Value>> {
    ensure(user.role, Action::DeleteOrders)?;

    state.checkout().delete_order(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
