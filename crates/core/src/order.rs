//! Orders, checkout validation, and the payment status state machine.
//!
//! An order is an immutable record of a checkout attempt. Its `total` is a
//! frozen copy of the cart total at creation time and is never re-derived
//! from the line items; later cart mutations never touch an existing
//! order.
//!
//! # Status lifecycle
//!
//! ```text
//! Pending ──────────────┬──> Completed
//!    │                  └──> Failed
//!    └──> PendingVerification ──> Completed | Failed
//! ```
//!
//! `Pending` orders advance through the payment gateway callback (amount
//! checked against the frozen total). `PendingVerification` orders advance
//! only through manual receipt review. `Completed` and `Failed` are
//! terminal for the automated flow; an admin override can still force
//! either terminal status from any state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItem};
use crate::types::{Email, EmailError, OrderId, PaymentId, ProductId, UserId};

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Redirect-based wallet payment, confirmed by a gateway callback.
    Nequi,
    /// Bank transfer, confirmed by manual receipt review.
    Bancolombia,
    /// Bank transfer, confirmed by manual receipt review.
    Bbva,
}

impl PaymentMethod {
    /// Status a freshly created order starts in for this method.
    #[must_use]
    pub const fn initial_status(self) -> OrderStatus {
        match self {
            Self::Nequi => OrderStatus::Pending,
            Self::Bancolombia | Self::Bbva => OrderStatus::PendingVerification,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nequi => write!(f, "nequi"),
            Self::Bancolombia => write!(f, "bancolombia"),
            Self::Bbva => write!(f, "bbva"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nequi" => Ok(Self::Nequi),
            "bancolombia" => Ok(Self::Bancolombia),
            "bbva" => Ok(Self::Bbva),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Where an order sits in its payment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting redirect-based gateway confirmation.
    Pending,
    /// Awaiting manual review of an uploaded payment receipt.
    PendingVerification,
    /// Payment confirmed.
    Completed,
    /// Payment rejected or abandoned.
    Failed,
}

impl OrderStatus {
    /// Terminal states take no further automated transition. An admin
    /// override is the only way out.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the automated lifecycle permits moving to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::PendingVerification | Self::Completed | Self::Failed
            ),
            Self::PendingVerification => matches!(next, Self::Completed | Self::Failed),
            Self::Completed | Self::Failed => false,
        }
    }

    /// Whether an admin override may force this status. Overrides target
    /// only the terminal bookkeeping states.
    #[must_use]
    pub const fn is_override_target(self) -> bool {
        self.is_terminal()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::PendingVerification => write!(f, "pending_verification"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pending_verification" => Ok(Self::PendingVerification),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Contact and shipping details captured by the checkout form.
///
/// Fields are raw strings; [`Order::try_new`] validates them before any
/// persistence happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
}

/// A frozen order line, copied from a cart item at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&CartItem> for OrderLineItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
        }
    }
}

/// Checkout rejected before any persistence was attempted.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckoutError {
    /// The cart snapshot holds no items.
    #[error("cannot create an order from an empty cart")]
    EmptyCart,
    /// A required customer field is blank.
    #[error("required field is blank: {0}")]
    BlankField(&'static str),
    /// The customer email does not parse.
    #[error("invalid customer email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// An immutable record of a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderLineItem>,
    /// Frozen copy of the cart total at creation time. Never recomputed.
    pub total: Decimal,
    pub customer: CustomerInfo,
    /// Owning user. The stored contract keeps this nullable so order
    /// history survives user deletion, but checkout requires a login,
    /// so newly created orders always carry an owner.
    pub user_id: Option<UserId>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// Public URL of the uploaded bank-transfer receipt, if any.
    pub receipt_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build an order from a cart snapshot and checkout form data.
    ///
    /// Validates synchronously: the cart must be non-empty, every customer
    /// field non-blank, and the email structurally valid. The order total
    /// is frozen from `cart.total` here and never touched again.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] on an empty cart, a blank field, or a
    /// malformed email. No side effects occur on rejection.
    pub fn try_new(
        cart: &Cart,
        customer: CustomerInfo,
        payment_method: PaymentMethod,
        user_id: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        require_non_blank(&customer.name, "name")?;
        require_non_blank(&customer.email, "email")?;
        require_non_blank(&customer.phone, "phone")?;
        require_non_blank(&customer.shipping_address, "shipping_address")?;
        Email::parse(&customer.email)?;

        Ok(Self {
            id: OrderId::generate(),
            items: cart.items.iter().map(OrderLineItem::from).collect(),
            total: cart.total,
            customer,
            user_id,
            payment_method,
            status: payment_method.initial_status(),
            receipt_url: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Work out the status a gateway callback moves this order to.
    ///
    /// Only `Pending` orders accept callbacks, and the callback `amount`
    /// must equal the frozen order total. The order itself is not
    /// modified; the caller persists the returned status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAwaitingGateway`] unless the order is
    /// `Pending`, and [`TransitionError::AmountMismatch`] when the amounts
    /// differ. In both cases the order status is left unchanged.
    pub fn apply_gateway_callback(
        &self,
        callback: &PaymentCallback,
    ) -> Result<OrderStatus, TransitionError> {
        if self.status != OrderStatus::Pending {
            return Err(TransitionError::NotAwaitingGateway {
                status: self.status,
            });
        }

        if callback.amount != self.total {
            return Err(TransitionError::AmountMismatch {
                callback: callback.amount,
                total: self.total,
            });
        }

        Ok(match callback.status {
            CallbackStatus::Approved => OrderStatus::Completed,
            CallbackStatus::Declined => OrderStatus::Failed,
        })
    }

    /// Work out the status a manual receipt review moves this order to.
    ///
    /// Only `PendingVerification` orders accept a review decision.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAwaitingReview`] for any other
    /// status.
    pub fn review_receipt(&self, approved: bool) -> Result<OrderStatus, TransitionError> {
        if self.status != OrderStatus::PendingVerification {
            return Err(TransitionError::NotAwaitingReview {
                status: self.status,
            });
        }

        Ok(if approved {
            OrderStatus::Completed
        } else {
            OrderStatus::Failed
        })
    }
}

fn require_non_blank(value: &str, field: &'static str) -> Result<(), CheckoutError> {
    if value.trim().is_empty() {
        return Err(CheckoutError::BlankField(field));
    }
    Ok(())
}

/// Outcome reported by the payment gateway callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Approved,
    Declined,
}

/// Inbound payment-gateway confirmation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub status: CallbackStatus,
    pub amount: Decimal,
}

/// A status transition was refused; the order keeps its prior status.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransitionError {
    /// Callback amount does not match the frozen order total.
    #[error("callback amount {callback} does not match order total {total}")]
    AmountMismatch { callback: Decimal, total: Decimal },
    /// A gateway callback arrived for an order that is not `Pending`.
    #[error("order is not awaiting gateway confirmation (status: {status})")]
    NotAwaitingGateway { status: OrderStatus },
    /// A receipt review was attempted on an order that is not
    /// `PendingVerification`.
    #[error("order is not awaiting receipt review (status: {status})")]
    NotAwaitingReview { status: OrderStatus },
    /// An admin override targeted a non-terminal status.
    #[error("admin override may only force completed or failed, got {status}")]
    InvalidOverrideTarget { status: OrderStatus },
}
