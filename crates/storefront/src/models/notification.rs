//! Notification domain type.

use chrono::{DateTime, Utc};

use smart_shop_core::{NotificationId, UserId};

/// A message in a user's notification feed.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
