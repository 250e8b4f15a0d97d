//! Business services for the storefront.
//!
//! Pure domain rules live in `comelones-core`; these services supply
//! the effects around them: session and database synchronization,
//! catalog caching, the payment gateway, and receipt storage.

pub mod cart_sync;
pub mod catalog;
pub mod checkout;
pub mod nequi;
pub mod receipts;

pub use cart_sync::{CartSync, CartView};
pub use catalog::Catalog;
pub use checkout::{Checkout, CheckoutOutcome};
pub use nequi::{GatewayError, NequiClient};
pub use receipts::{ReceiptError, ReceiptStore};
