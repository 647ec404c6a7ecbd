//! Order domain types.

use chrono::{DateTime, Utc};

use smart_shop_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

/// A placed order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Delivery address snapshot taken at checkout.
    pub address: String,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    /// Gateway order/payment ID for online payments.
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A line of an order, priced at the time of purchase.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub quantity: i32,
}

impl OrderItem {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(u32::try_from(self.quantity).unwrap_or(0))
    }
}

/// An order together with its items.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
