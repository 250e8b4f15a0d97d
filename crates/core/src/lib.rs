//! ComelonesFit Core - Shared domain library.
//!
//! This crate provides the domain types and state machines used across all
//! ComelonesFit components:
//! - `storefront` - Public-facing storefront service
//! - `cli` - Command-line tools for migrations and operations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. The cart reducer, the cart merge
//! heuristic, the order lifecycle state machine, and the role policy all
//! live here so they can be tested without a running service, while the
//! storefront crate supplies the asynchronous effect layer around them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails
//! - [`cart`] - Cart state, the mutation reducer, and the merge heuristic
//! - [`order`] - Orders, checkout validation, and the payment status machine
//! - [`role`] - User roles and the capability policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod role;
pub mod types;

pub use types::*;
