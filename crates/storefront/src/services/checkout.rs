//! Checkout and order lifecycle orchestration.
//!
//! The pure state machine lives in `comelones_core::order`; this module
//! wires it to the repositories and the payment gateway. Every status
//! change is computed against the current order first, then persisted
//! with a guard on the expected prior status, so a lost race surfaces
//! as a conflict rather than a silent overwrite.

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};

use comelones_core::order::{
    CustomerInfo, Order, OrderStatus, PaymentCallback, PaymentMethod,
};
use comelones_core::cart::Cart;
use comelones_core::{OrderId, UserId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};

use super::nequi::NequiClient;
use super::receipts::ReceiptStore;

/// Outcome of a successful checkout.
#[derive(Debug, serde::Serialize)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total: rust_decimal::Decimal,
    /// Gateway approval URL. Present for Nequi payments only; bank
    /// transfers skip the gateway and await a receipt upload instead.
    pub redirect_url: Option<String>,
}

/// Checkout service.
#[derive(Clone)]
pub struct Checkout {
    pool: PgPool,
    nequi: NequiClient,
    receipts: ReceiptStore,
}

impl Checkout {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: PgPool, nequi: NequiClient, receipts: ReceiptStore) -> Self {
        Self {
            pool,
            nequi,
            receipts,
        }
    }

    /// Create an order from a cart and, for Nequi payments, open a
    /// payment intent with the gateway.
    ///
    /// The order is persisted before the gateway call: if the gateway
    /// is down the order survives as `Pending` and the client receives
    /// a gateway error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Checkout` when validation fails,
    /// `AppError::Gateway` when the payment intent cannot be created.
    pub async fn create_order(
        &self,
        cart: &Cart,
        customer: CustomerInfo,
        payment_method: PaymentMethod,
        user_id: Option<UserId>,
    ) -> Result<CheckoutOutcome> {
        let order = Order::try_new(cart, customer, payment_method, user_id, Utc::now())?;
        OrderRepository::new(&self.pool).insert(&order).await?;

        info!(
            order_id = %order.id,
            total = %order.total,
            method = %order.payment_method,
            "order created"
        );

        let redirect_url = if payment_method == PaymentMethod::Nequi {
            let payment = self.nequi.create_payment(&order.id, order.total).await?;
            Some(payment.redirect_url)
        } else {
            None
        };

        Ok(CheckoutOutcome {
            order_id: order.id,
            status: order.status,
            total: order.total,
            redirect_url,
        })
    }

    /// Apply a gateway payment callback.
    ///
    /// Idempotent from the gateway's point of view: a replayed callback
    /// finds the order no longer `Pending` and is rejected as a
    /// transition conflict without changing anything.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown orders and
    /// `AppError::Transition` when the callback is rejected (wrong
    /// amount, order not awaiting the gateway).
    pub async fn handle_callback(&self, callback: &PaymentCallback) -> Result<OrderStatus> {
        let repo = OrderRepository::new(&self.pool);
        let order = repo
            .get(&callback.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {}", callback.order_id)))?;

        let next = order.apply_gateway_callback(callback).inspect_err(|e| {
            warn!(
                order_id = %callback.order_id,
                payment_id = %callback.payment_id,
                error = %e,
                "gateway callback rejected"
            );
        })?;

        repo.transition(&order.id, order.status, next, Utc::now())
            .await?;

        info!(order_id = %order.id, from = %order.status, to = %next, "gateway callback applied");
        Ok(next)
    }

    /// Store an uploaded receipt and attach its URL to the order.
    ///
    /// Allowed for any existing order; a customer may re-upload a
    /// clearer receipt while verification is still pending.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown orders,
    /// `AppError::Receipt` when the upload is invalid or cannot be
    /// stored.
    pub async fn attach_receipt(
        &self,
        order_id: &OrderId,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let repo = OrderRepository::new(&self.pool);
        let order = repo
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

        let url = self.receipts.save(&order.id, content_type, bytes).await?;
        repo.set_receipt_url(&order.id, &url, Utc::now()).await?;

        info!(order_id = %order.id, "receipt attached");
        Ok(url)
    }

    /// Admin review of a bank-transfer receipt.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown orders and
    /// `AppError::Transition` when the order is not awaiting review.
    pub async fn review_receipt(&self, order_id: &OrderId, approved: bool) -> Result<OrderStatus> {
        let repo = OrderRepository::new(&self.pool);
        let order = repo
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

        let next = order.review_receipt(approved)?;
        repo.transition(&order.id, order.status, next, Utc::now())
            .await?;

        info!(order_id = %order.id, approved, to = %next, "receipt reviewed");
        Ok(next)
    }

    /// Admin override: force an order into a terminal status,
    /// bypassing the normal transition guard.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transition` when the target is not terminal
    /// and `AppError::NotFound` for unknown orders.
    pub async fn override_status(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
    ) -> Result<OrderStatus> {
        if !target.is_override_target() {
            return Err(AppError::Transition(
                comelones_core::order::TransitionError::InvalidOverrideTarget { status: target },
            ));
        }

        let repo = OrderRepository::new(&self.pool);
        repo.force_status(order_id, target, Utc::now()).await?;

        warn!(order_id = %order_id, to = %target, "order status overridden");
        Ok(target)
    }

    /// Delete an order outright.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when the order does not exist.
    pub async fn delete_order(&self, order_id: &OrderId) -> Result<()> {
        let deleted = OrderRepository::new(&self.pool).delete(order_id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("order {order_id}")));
        }

        warn!(order_id = %order_id, "order deleted");
        Ok(())
    }
}
