//! Inbound gateway webhooks.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use comelones_core::OrderId;
use comelones_core::order::{OrderStatus, PaymentCallback};

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// `POST /webhooks/nequi` - gateway payment confirmation.
///
/// Rejected callbacks (wrong amount, order not awaiting the gateway)
/// come back as 409 so the gateway's retry machinery stops replaying
/// them against an already settled order.
#[instrument(skip_all, fields(order_id = %callback.order_id, payment_id = %callback.payment_id))]
pub async fn nequi_callback(
    State(state): State<AppState>,
    Json(callback): Json<PaymentCallback>,
) -> Result<Json<CallbackResponse>> {
    let status = state.checkout().handle_callback(&callback).await?;
    Ok(Json(CallbackResponse {
        order_id: callback.order_id,
        status,
    }))
}
