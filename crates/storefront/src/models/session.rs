//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state. The
//! cart itself is stored under [`keys::CART`] in its raw map form (see
//! `smart_shop_core::Cart::from_raw`).

use serde::{Deserialize, Serialize};

use smart_shop_core::{Email, Money, UserId, Username};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Login name, shown in the navigation bar.
    pub username: Username,
    /// User's email address.
    pub email: Email,
}

impl From<&super::User> for CurrentUser {
    fn from(user: &super::User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// An online checkout waiting for the customer to come back from the
/// payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCheckout {
    /// Delivery address entered on the checkout form.
    pub address: String,
    /// Cart total when the checkout was started.
    pub amount: Money,
    /// Gateway order created for the payment, when a gateway is configured.
    pub gateway_order_id: Option<String>,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the raw cart map.
    pub const CART: &str = "cart";

    /// Key for an online checkout awaiting payment.
    pub const PENDING_CHECKOUT: &str = "pending_checkout";
}
