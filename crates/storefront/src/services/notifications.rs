//! Per-user notification feed.
//!
//! Notifications are appended by order events (placement, payment,
//! cancellation, staff progression) and read back on the notifications page
//! and in the navigation badge.

use sqlx::PgPool;

use smart_shop_core::{NotificationId, OrderId, StaffAction, UserId};

use crate::db::{NotificationRepository, RepositoryError};
use crate::models::Notification;

/// How many unread notifications the navigation dropdown shows.
pub const NAV_PREVIEW_LIMIT: i64 = 5;

/// Message texts for order events.
pub mod messages {
    use super::{OrderId, StaffAction};

    #[must_use]
    pub fn order_placed(order_id: OrderId) -> String {
        format!("Order #{order_id} placed successfully")
    }

    #[must_use]
    pub fn online_payment(order_id: OrderId) -> String {
        format!("Online payment successful for Order #{order_id}")
    }

    #[must_use]
    pub fn order_cancelled(order_id: OrderId) -> String {
        format!("Order #{order_id} cancelled")
    }

    #[must_use]
    pub fn staff_action(order_id: OrderId, action: StaffAction) -> String {
        format!("Your Order #{order_id} has been {}", action.past_tense())
    }
}

/// Unread badge data for the navigation bar.
#[derive(Debug, Clone, Default)]
pub struct NotificationSummary {
    pub unread_count: i64,
    pub latest_unread: Vec<Notification>,
}

/// Notification feed operations for one user at a time.
pub struct NotificationService<'a> {
    notifications: NotificationRepository<'a>,
}

impl<'a> NotificationService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            notifications: NotificationRepository::new(pool),
        }
    }

    /// All of a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>, RepositoryError> {
        self.notifications.list_for_user(user_id).await
    }

    /// Unread count and the latest unread notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn summary(&self, user_id: UserId) -> Result<NotificationSummary, RepositoryError> {
        Ok(NotificationSummary {
            unread_count: self.notifications.unread_count(user_id).await?,
            latest_unread: self
                .notifications
                .latest_unread(user_id, NAV_PREVIEW_LIMIT)
                .await?,
        })
    }

    /// Mark one of the user's notifications read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it is not the user's notification.
    pub async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<(), RepositoryError> {
        if self.notifications.mark_read(user_id, id).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    /// Mark every notification of the user read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        self.notifications.mark_all_read(user_id).await
    }

    /// Delete one of the user's notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it is not the user's notification.
    pub async fn delete(&self, user_id: UserId, id: NotificationId) -> Result<(), RepositoryError> {
        if self.notifications.delete(user_id, id).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    /// Delete all of the user's notifications. Clearing an empty feed is fine.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let removed = self.notifications.clear(user_id).await?;
        tracing::debug!(user_id = %user_id, removed, "Notifications cleared");
        Ok(removed)
    }
}
