//! Order cancellation, staff progression and dashboard figures.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;

use smart_shop_core::{OrderId, OrderStatus, PaymentMethod, StaffAction};
use smart_shop_integration_tests::{count, placed_order, product, rupees, stock, user};
use smart_shop_storefront::services::notifications::NotificationService;
use smart_shop_storefront::services::orders::{CancelOutcome, OrderError, OrderService};

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn cancelling_a_placed_order_notifies_without_restocking(pool: PgPool) {
    let buyer = user(&pool, "alice").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 5).await;
    let order = placed_order(&pool, buyer.id, &lamp, 2, PaymentMethod::Cod).await;
    let notifications_before = count(&pool, "notification").await;

    let service = OrderService::new(&pool);
    let outcome = service.cancel(order.id, buyer.id).await.unwrap();
    assert_eq!(outcome, CancelOutcome::Cancelled);

    let detail = service.get_for_user(order.id, buyer.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Cancelled);
    assert_eq!(stock(&pool, &lamp).await, 3);

    assert_eq!(count(&pool, "notification").await, notifications_before + 1);
    let latest = NotificationService::new(&pool).list(buyer.id).await.unwrap();
    assert_eq!(latest[0].message, format!("Order #{} cancelled", order.id));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn confirmed_orders_cancel_once(pool: PgPool) {
    let buyer = user(&pool, "gina").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 5).await;
    let order = placed_order(&pool, buyer.id, &lamp, 1, PaymentMethod::Cod).await;

    let service = OrderService::new(&pool);
    service.advance(order.id, StaffAction::Confirm).await.unwrap();
    let before_cancel = count(&pool, "notification").await;

    let outcome = service.cancel(order.id, buyer.id).await.unwrap();
    assert_eq!(outcome, CancelOutcome::Cancelled);
    assert_eq!(count(&pool, "notification").await, before_cancel + 1);

    let again = service.cancel(order.id, buyer.id).await.unwrap();
    assert_eq!(again, CancelOutcome::NotCancellable(OrderStatus::Cancelled));
    assert_eq!(count(&pool, "notification").await, before_cancel + 1);
    assert_eq!(stock(&pool, &lamp).await, 4);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn shipped_orders_cannot_be_cancelled(pool: PgPool) {
    let buyer = user(&pool, "bob").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 5).await;
    let order = placed_order(&pool, buyer.id, &lamp, 1, PaymentMethod::Cod).await;

    let service = OrderService::new(&pool);
    service.advance(order.id, StaffAction::Confirm).await.unwrap();
    service.advance(order.id, StaffAction::Ship).await.unwrap();
    let notifications_before = count(&pool, "notification").await;

    let outcome = service.cancel(order.id, buyer.id).await.unwrap();
    assert_eq!(outcome, CancelOutcome::NotCancellable(OrderStatus::Shipped));

    let detail = service.get_for_user(order.id, buyer.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Shipped);
    assert_eq!(count(&pool, "notification").await, notifications_before);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn other_customers_orders_look_missing(pool: PgPool) {
    let owner = user(&pool, "carol").await;
    let stranger = user(&pool, "mallory").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 5).await;
    let order = placed_order(&pool, owner.id, &lamp, 1, PaymentMethod::Cod).await;

    let service = OrderService::new(&pool);
    assert!(matches!(
        service.get_for_user(order.id, stranger.id).await,
        Err(OrderError::NotFound)
    ));
    assert!(matches!(
        service.cancel(order.id, stranger.id).await,
        Err(OrderError::NotFound)
    ));
    assert!(service.list_for_user(stranger.id).await.unwrap().is_empty());

    let detail = service.get_for_user(order.id, owner.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Placed);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn staff_progression_follows_the_lifecycle(pool: PgPool) {
    let buyer = user(&pool, "dave").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 5).await;
    let order = placed_order(&pool, buyer.id, &lamp, 1, PaymentMethod::Cod).await;

    let service = OrderService::new(&pool);
    let result = service.advance(order.id, StaffAction::Ship).await;
    assert!(matches!(
        result,
        Err(OrderError::InvalidTransition {
            from: OrderStatus::Placed,
            to: OrderStatus::Shipped,
        })
    ));

    let confirmed = service.advance(order.id, StaffAction::Confirm).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let messages: Vec<String> = NotificationService::new(&pool)
        .list(buyer.id)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert!(messages.contains(&format!("Your Order #{} has been confirmed", order.id)));

    assert!(matches!(
        service.advance(OrderId::new(order.id.as_i32() + 1000), StaffAction::Confirm).await,
        Err(OrderError::NotFound)
    ));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn dashboard_revenue_counts_paid_orders_only(pool: PgPool) {
    let buyer = user(&pool, "erin").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 20).await;
    let _ = user(&pool, "frank").await;

    placed_order(&pool, buyer.id, &lamp, 2, PaymentMethod::Cod).await;
    placed_order(&pool, buyer.id, &lamp, 3, PaymentMethod::Online).await;

    let stats = OrderService::new(&pool).dashboard().await.unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.revenue, rupees(300));
    assert_eq!(stats.by_status.len(), OrderStatus::ALL.len());
    assert_eq!(
        stats.by_status.iter().find(|(s, _)| *s == OrderStatus::Placed),
        Some(&(OrderStatus::Placed, 2))
    );
    assert!(stats.low_stock.is_empty());
}
