//! Order history, cancellation and staff progression.
//!
//! Customers only ever reach their own orders: every lookup goes through
//! [`OrderService::get_for_user`], which reports a foreign order exactly like
//! a missing one.

use sqlx::PgPool;
use thiserror::Error;

use smart_shop_core::{Money, OrderId, OrderStatus, StaffAction, UserId};

use crate::db::{
    CatalogRepository, NotificationRepository, OrderRepository, RepositoryError, UserRepository,
};
use crate::models::{Order, OrderDetail, Product};
use crate::services::notifications::messages;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No such order, or it belongs to someone else.
    #[error("order not found")]
    NotFound,

    /// The requested status change does not follow the order lifecycle.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// What a cancel request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// The order was past the point of cancellation; nothing changed.
    NotCancellable(OrderStatus),
}

/// Figures for the operator dashboard.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub total_users: i64,
    /// Sum over orders with payment status `PAID`.
    pub revenue: Money,
    /// Order counts in lifecycle order, including zero counts.
    pub by_status: Vec<(OrderStatus, i64)>,
    pub low_stock: Vec<Product>,
}

/// Order operations.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
        }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// An order with its items, if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for a missing or foreign order.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<OrderDetail, OrderError> {
        let order = self
            .orders
            .get_for_user(order_id, user_id)
            .await?
            .ok_or(OrderError::NotFound)?;
        let items = self.orders.items(order.id).await?;
        Ok(OrderDetail { order, items })
    }

    /// Cancel a customer's order.
    ///
    /// Orders past `CONFIRMED` are left untouched. Stock is not returned to
    /// the catalog.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for a missing or foreign order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<CancelOutcome, OrderError> {
        let order = self
            .orders
            .get_for_user(order_id, user_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !order.status.can_cancel() {
            return Ok(CancelOutcome::NotCancellable(order.status));
        }

        let mut tx = self.pool.begin().await?;
        let moved =
            OrderRepository::transition(&mut tx, order.id, order.status, OrderStatus::Cancelled)
                .await?;
        if !moved {
            // Changed underneath us; report the fresh status.
            drop(tx);
            let current = self
                .orders
                .get_for_user(order_id, user_id)
                .await?
                .ok_or(OrderError::NotFound)?;
            return Ok(CancelOutcome::NotCancellable(current.status));
        }
        NotificationRepository::insert(&mut tx, user_id, &messages::order_cancelled(order.id))
            .await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, "Order cancelled");
        Ok(CancelOutcome::Cancelled)
    }

    /// Move an order forward on behalf of staff and notify its owner.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order doesn't exist.
    /// Returns `OrderError::InvalidTransition` if the action does not follow
    /// from the current status.
    #[tracing::instrument(skip(self))]
    pub async fn advance(&self, order_id: OrderId, action: StaffAction) -> Result<Order, OrderError> {
        let order = self.orders.get(order_id).await?.ok_or(OrderError::NotFound)?;
        let target = action.target();

        if !order.status.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        let mut tx = self.pool.begin().await?;
        if !OrderRepository::transition(&mut tx, order.id, order.status, target).await? {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }
        NotificationRepository::insert(
            &mut tx,
            order.user_id,
            &messages::staff_action(order.id, action),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, status = %target, "Order advanced");
        Ok(Order {
            status: target,
            ..order
        })
    }

    /// Business dashboard figures.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, OrderError> {
        let counts = self.orders.count_by_status().await?;
        let by_status = OrderStatus::ALL
            .iter()
            .map(|status| {
                let count = counts
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, c)| *c);
                (*status, count)
            })
            .collect();

        Ok(DashboardStats {
            total_orders: self.orders.count().await?,
            total_users: UserRepository::new(self.pool).count().await?,
            revenue: self.orders.paid_revenue().await?,
            by_status,
            low_stock: CatalogRepository::new(self.pool)
                .low_stock(Product::LOW_STOCK_THRESHOLD)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = OrderError::InvalidTransition {
            from: OrderStatus::Placed,
            to: OrderStatus::Delivered,
        };
        assert_eq!(err.to_string(), "cannot move order from PLACED to DELIVERED");
    }
}
