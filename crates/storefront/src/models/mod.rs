//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the `FromRow` row types
//! in [`crate::db`].

pub mod catalog;
pub mod notification;
pub mod order;
pub mod session;
pub mod user;

pub use catalog::{Category, Product};
pub use notification::Notification;
pub use order::{Order, OrderDetail, OrderItem};
pub use session::{CurrentUser, PendingCheckout, keys as session_keys};
pub use user::{Profile, User};
