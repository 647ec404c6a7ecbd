//! Notification repository.
//!
//! Every query is scoped by `user_id`, so a user can only ever see or touch
//! their own notifications.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use smart_shop_core::{NotificationId, UserId};

use super::RepositoryError;
use crate::models::Notification;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i32,
    user_id: i32,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::new(row.id),
            user_id: UserId::new(row.user_id),
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

/// Repository for notification database operations.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a notification inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: UserId,
        message: &str,
    ) -> Result<NotificationId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO shop.notification (user_id, message) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id.as_i32())
        .bind(message)
        .fetch_one(conn)
        .await?;
        Ok(NotificationId::new(id))
    }

    /// All of a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"
            SELECT id, user_id, message, is_read, created_at
            FROM shop.notification
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// The newest `limit` unread notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_unread(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"
            SELECT id, user_id, message, is_read, created_at
            FROM shop.notification
            WHERE user_id = $1 AND NOT is_read
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(user_id.as_i32())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.notification WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Mark one notification read. Returns `false` if it isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.notification SET is_read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id.as_i32())
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every notification read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.notification SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete one notification. Returns `false` if it isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: NotificationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.notification WHERE id = $1 AND user_id = $2")
            .bind(id.as_i32())
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all of a user's notifications. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.notification WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
