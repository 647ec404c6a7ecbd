//! User domain types.

use chrono::{DateTime, Utc};

use smart_shop_core::{Email, UserId, Username};

/// A registered shop account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    /// Inactive accounts cannot log in until their email is verified.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact details kept alongside an account.
///
/// `address` is overwritten with the latest checkout address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: UserId,
    pub phone: String,
    pub address: String,
}

impl Profile {
    /// An empty profile for a user who has not saved any details yet.
    #[must_use]
    pub const fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            phone: String::new(),
            address: String::new(),
        }
    }
}
