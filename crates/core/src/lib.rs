//! Smart Shop Core - Shared domain types.
//!
//! This crate provides the types shared by the Smart Shop components:
//! - `storefront` - Customer-facing shop (catalog, cart, checkout, account)
//! - `cli` - Operator tooling (migrations, catalog seeding, order progression)
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The session cart and the order state machine live here so
//! they can be tested without a running database.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, usernames, money, order statuses
//! - [`cart`] - The per-session shopping cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartError, CartUpdate, Quantity};
pub use types::*;
