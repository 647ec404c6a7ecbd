//! Staff order progression and the business dashboard.

use smart_shop_core::{OrderId, StaffAction};
use smart_shop_storefront::services::orders::OrderService;

use super::{CommandError, connect};

/// Confirm, ship or deliver an order. The customer gets a notification.
pub async fn advance(order_id: OrderId, action: StaffAction) -> Result<(), CommandError> {
    let pool = connect().await?;

    let order = OrderService::new(&pool).advance(order_id, action).await?;
    tracing::info!(
        "Order #{} is now {} (customer notified)",
        order.id,
        order.status.label()
    );
    Ok(())
}

/// Log order, revenue and low-stock figures.
pub async fn stats() -> Result<(), CommandError> {
    let pool = connect().await?;
    let stats = OrderService::new(&pool).dashboard().await?;

    tracing::info!("Smart Shop Dashboard");
    tracing::info!("====================");
    tracing::info!("Total orders: {}", stats.total_orders);
    tracing::info!("Total users:  {}", stats.total_users);
    tracing::info!("Revenue (paid): {}", stats.revenue);
    tracing::info!("By status:");
    for (status, count) in &stats.by_status {
        tracing::info!("  {}: {count}", status.label());
    }

    if stats.low_stock.is_empty() {
        tracing::info!("No products are low on stock");
    } else {
        tracing::info!("Low stock:");
        for product in &stats.low_stock {
            tracing::info!("  #{} {}: {} left", product.id, product.name, product.stock);
        }
    }

    Ok(())
}
