//! Notification feed: listing, badge summary, read state, delete and clear.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;

use smart_shop_core::{NotificationId, PaymentMethod, StaffAction};
use smart_shop_integration_tests::{count, placed_order, product, rupees, user};
use smart_shop_storefront::db::RepositoryError;
use smart_shop_storefront::models::Notification;
use smart_shop_storefront::services::notifications::{NAV_PREVIEW_LIMIT, NotificationService};
use smart_shop_storefront::services::orders::OrderService;

fn messages(feed: &[Notification]) -> Vec<&str> {
    feed.iter().map(|n| n.message.as_str()).collect()
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn feed_lists_order_events_newest_first(pool: PgPool) {
    let alice = user(&pool, "alice").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 5).await;
    let order = placed_order(&pool, alice.id, &lamp, 1, PaymentMethod::Cod).await;

    let orders = OrderService::new(&pool);
    orders.advance(order.id, StaffAction::Confirm).await.unwrap();
    orders.cancel(order.id, alice.id).await.unwrap();

    let feed = NotificationService::new(&pool).list(alice.id).await.unwrap();
    assert_eq!(
        messages(&feed),
        [
            format!("Order #{} cancelled", order.id),
            format!("Your Order #{} has been confirmed", order.id),
            format!("Order #{} placed successfully", order.id),
        ]
    );
    assert!(feed.iter().all(|n| n.user_id == alice.id && !n.is_read));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn summary_caps_the_preview_and_counts_all_unread(pool: PgPool) {
    let bob = user(&pool, "bob").await;
    let pen = product(&pool, "Pen", rupees(10), 50).await;
    let mut last = None;
    for _ in 0..7 {
        last = Some(placed_order(&pool, bob.id, &pen, 1, PaymentMethod::Cod).await);
    }

    let summary = NotificationService::new(&pool).summary(bob.id).await.unwrap();
    assert_eq!(summary.unread_count, 7);
    assert_eq!(summary.latest_unread.len(), usize::try_from(NAV_PREVIEW_LIMIT).unwrap());
    assert_eq!(
        summary.latest_unread[0].message,
        format!("Order #{} placed successfully", last.unwrap().id)
    );
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn read_state_is_per_notification_and_per_user(pool: PgPool) {
    let carol = user(&pool, "carol").await;
    let dave = user(&pool, "dave").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 10).await;
    placed_order(&pool, carol.id, &lamp, 1, PaymentMethod::Cod).await;
    placed_order(&pool, carol.id, &lamp, 1, PaymentMethod::Cod).await;
    placed_order(&pool, dave.id, &lamp, 1, PaymentMethod::Cod).await;

    let service = NotificationService::new(&pool);
    let feed = service.list(carol.id).await.unwrap();

    service.mark_read(carol.id, feed[0].id).await.unwrap();
    assert_eq!(service.summary(carol.id).await.unwrap().unread_count, 1);

    assert!(matches!(
        service.mark_read(dave.id, feed[1].id).await,
        Err(RepositoryError::NotFound)
    ));
    assert_eq!(service.summary(carol.id).await.unwrap().unread_count, 1);

    assert_eq!(service.mark_all_read(carol.id).await.unwrap(), 1);
    assert_eq!(service.summary(carol.id).await.unwrap().unread_count, 0);
    assert!(service.list(carol.id).await.unwrap().iter().all(|n| n.is_read));
    assert_eq!(service.summary(dave.id).await.unwrap().unread_count, 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn delete_only_touches_the_owners_notification(pool: PgPool) {
    let erin = user(&pool, "erin").await;
    let frank = user(&pool, "frank").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 10).await;
    placed_order(&pool, erin.id, &lamp, 1, PaymentMethod::Cod).await;
    placed_order(&pool, erin.id, &lamp, 1, PaymentMethod::Cod).await;

    let service = NotificationService::new(&pool);
    let feed = service.list(erin.id).await.unwrap();

    assert!(matches!(
        service.delete(frank.id, feed[0].id).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(matches!(
        service.delete(erin.id, NotificationId::new(99_999)).await,
        Err(RepositoryError::NotFound)
    ));
    assert_eq!(count(&pool, "notification").await, 2);

    service.delete(erin.id, feed[0].id).await.unwrap();
    let remaining = service.list(erin.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, feed[1].id);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn clear_is_idempotent_and_scoped_to_the_user(pool: PgPool) {
    let gina = user(&pool, "gina").await;
    let hugo = user(&pool, "hugo").await;
    let lamp = product(&pool, "Desk Lamp", rupees(100), 10).await;
    placed_order(&pool, gina.id, &lamp, 1, PaymentMethod::Cod).await;
    placed_order(&pool, gina.id, &lamp, 1, PaymentMethod::Cod).await;
    placed_order(&pool, hugo.id, &lamp, 1, PaymentMethod::Cod).await;

    let service = NotificationService::new(&pool);
    assert_eq!(service.clear(gina.id).await.unwrap(), 2);
    assert_eq!(service.clear(gina.id).await.unwrap(), 0);

    assert!(service.list(gina.id).await.unwrap().is_empty());
    assert_eq!(service.list(hugo.id).await.unwrap().len(), 1);
}
