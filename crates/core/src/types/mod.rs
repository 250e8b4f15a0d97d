//! Newtype wrappers shared across the workspace.

mod email;
mod id;

pub use email::{Email, EmailError};
pub use id::{OrderId, PaymentId, ProductId, UserId};
