//! Order repository: orders, order items and order statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use smart_shop_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    address: String,
    total_amount: Decimal,
    payment_method: String,
    payment_status: String,
    status: String,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_method = row
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| RepositoryError::corrupt("payment_method", e))?;
        let payment_status = row
            .payment_status
            .parse::<PaymentStatus>()
            .map_err(|e| RepositoryError::corrupt("payment_status", e))?;
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::corrupt("status", e))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            address: row.address,
            total_amount: Money::new(row.total_amount),
            payment_method,
            payment_status,
            status,
            payment_reference: row.payment_reference,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    price: Decimal,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            price: Money::new(row.price),
            quantity: row.quantity,
        }
    }
}

/// Fields of a new order.
#[derive(Debug, Clone)]
pub struct NewOrder<'o> {
    pub user_id: UserId,
    pub address: &'o str,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<&'o str>,
}

#[derive(sqlx::FromRow)]
struct StatusCountRow {
    status: String,
    count: i64,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order in status `PLACED` inside an open transaction.
    ///
    /// The payment status is derived from the payment method.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        conn: &mut PgConnection,
        order: &NewOrder<'_>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO shop.order
                (user_id, address, total_amount, payment_method, payment_status, status,
                 payment_reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, address, total_amount, payment_method, payment_status,
                      status, payment_reference, created_at
            ",
        )
        .bind(order.user_id.as_i32())
        .bind(order.address)
        .bind(order.total_amount.amount())
        .bind(order.payment_method.as_str())
        .bind(order.payment_method.initial_payment_status().as_str())
        .bind(OrderStatus::Placed.as_str())
        .bind(order.payment_reference)
        .fetch_one(conn)
        .await?;

        Order::try_from(row)
    }

    /// Insert one order line inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert_item(
        conn: &mut PgConnection,
        order_id: OrderId,
        product_id: ProductId,
        price: Money,
        quantity: i32,
    ) -> Result<OrderItemId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO shop.order_item (order_id, product_id, price, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(order_id.as_i32())
        .bind(product_id.as_i32())
        .bind(price.amount())
        .bind(quantity)
        .fetch_one(conn)
        .await?;
        Ok(OrderItemId::new(id))
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, address, total_amount, payment_method, payment_status,
                   status, payment_reference, created_at
            FROM shop.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Get an order only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, address, total_amount, payment_method, payment_status,
                   status, payment_reference, created_at
            FROM shop.order
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.as_i32())
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Get any order by ID (staff operations).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, address, total_amount, payment_method, payment_status,
                   status, payment_reference, created_at
            FROM shop.order
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Lines of an order with product names, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT i.id, i.order_id, i.product_id, p.name AS product_name, i.price, i.quantity
            FROM shop.order_item i
            JOIN shop.product p ON p.id = i.product_id
            WHERE i.order_id = $1
            ORDER BY i.id
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Move an order from `from` to `to` inside an open transaction.
    ///
    /// Returns `false` if the order was no longer in status `from`, which
    /// happens when a concurrent request changed it first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transition(
        conn: &mut PgConnection,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE shop.order SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id.as_i32())
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(conn)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Total number of orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.order")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of `total_amount` over paid orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn paid_revenue(&self) -> Result<Money, RepositoryError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total_amount), 0) FROM shop.order WHERE payment_status = $1",
        )
        .bind(PaymentStatus::Paid.as_str())
        .fetch_one(self.pool)
        .await?;
        Ok(Money::new(total))
    }

    /// Number of orders in each status. Statuses with no orders are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            "SELECT status, COUNT(*) AS count FROM shop.order GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status = row
                    .status
                    .parse::<OrderStatus>()
                    .map_err(|e| RepositoryError::corrupt("status", e))?;
                Ok((status, row.count))
            })
            .collect()
    }
}
