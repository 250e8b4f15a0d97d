//! Order handlers for customers.
//!
//! Customers see only their own orders; admin-class roles may list and
//! inspect everything. Receipt upload is limited to the order owner or
//! an admin so a bank-transfer payment can be verified.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use comelones_core::OrderId;
use comelones_core::order::{Order, OrderStatus};
use comelones_core::role::{Action, can};

use crate::db::{OrderFilter, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::receipts::MAX_RECEIPT_BYTES;
use crate::state::AppState;

/// Query parameters for `GET /orders`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub order_id: OrderId,
    pub receipt_url: String,
}

/// `GET /orders` - list orders.
///
/// Admin-class roles see every order and may filter; everyone else is
/// pinned to their own orders regardless of the query.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>> {
    let is_admin = can(user.role, Action::ListAllOrders);

    let filter = OrderFilter {
        status: query.status,
        user_id: if is_admin { None } else { Some(user.id) },
        created_after: query.created_after,
        created_before: query.created_before,
        newest_first: true,
        limit: query.limit,
    };

    let orders = OrderRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(orders))
}

/// `GET /orders/{id}` - order detail, for the owner or an admin.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let is_owner = order.user_id.as_ref() == Some(&user.id);
    if !is_owner && !can(user.role, Action::ListAllOrders) {
        // Hide the order's existence from non-owners
        return Err(AppError::NotFound(format!("order {id}")));
    }

    Ok(Json(order))
}

/// `POST /orders/{id}/receipt` - upload a bank-transfer receipt.
///
/// Multipart upload with a single `receipt` field, accepted from the
/// order's owner or an admin.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn upload_receipt(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    mut multipart: Multipart,
) -> Result<Json<ReceiptResponse>> {
    let order = OrderRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let is_owner = order.user_id.as_ref() == Some(&user.id);
    if !is_owner && !can(user.role, Action::ListAllOrders) {
        // Hide the order's existence from non-owners
        return Err(AppError::NotFound(format!("order {id}")));
    }

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
        .filter(|f| f.name() == Some("receipt"))
        .ok_or_else(|| AppError::BadRequest("missing receipt field".to_string()))?;

    let content_type = field
        .content_type()
        .map(str::to_owned)
        .ok_or_else(|| AppError::BadRequest("missing receipt content type".to_string()))?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;

    if bytes.len() > MAX_RECEIPT_BYTES {
        return Err(AppError::BadRequest("receipt too large".to_string()));
    }

    let receipt_url = state
        .checkout()
        .attach_receipt(&id, &content_type, &bytes)
        .await?;

    Ok(Json(ReceiptResponse {
        order_id: id,
        receipt_url,
    }))
}
