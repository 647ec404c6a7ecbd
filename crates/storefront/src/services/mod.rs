//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, email verification, login, password and profile edits
//! - `cart` - Session-backed cart and its catalog lookups
//! - `checkout` - Transactional order placement
//! - `orders` - Order history, cancellation, staff progression, dashboard
//! - `notifications` - Per-user notification feed
//! - `email` - Verification emails over SMTP
//! - `payment` - Online payment gateway client
//!
//! Services borrow the pool and construct repositories on demand. Workflows
//! that write more than one table open the transaction themselves.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod email;
pub mod notifications;
pub mod orders;
pub mod payment;
