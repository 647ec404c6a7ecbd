//! Order history, detail, cancellation and invoice.
//!
//! Orders of other customers answer exactly like missing ones.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use tracing::instrument;

use smart_shop_core::OrderId;

use crate::error::Result;
use crate::middleware::{Nav, RequireAuth};
use crate::models::{CurrentUser, Order, OrderDetail};
use crate::routes::{MessageQuery, parse_id, with_message};
use crate::services::orders::{CancelOutcome, OrderService};
use crate::state::AppState;

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/list.html")]
pub struct OrdersTemplate {
    pub nav: Nav,
    pub orders: Vec<Order>,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub nav: Nav,
    pub detail: OrderDetail,
}

/// Printable invoice.
#[derive(Template, WebTemplate)]
#[template(path = "orders/invoice.html")]
pub struct InvoiceTemplate {
    pub user: CurrentUser,
    pub detail: OrderDetail,
}

/// Display the customer's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    nav: Nav,
    Query(query): Query<MessageQuery>,
) -> Result<OrdersTemplate> {
    let orders = OrderService::new(state.pool()).list_for_user(user.id).await?;

    Ok(OrdersTemplate {
        nav,
        orders,
        error: query.error,
        info: query.info,
    })
}

/// Display one order with its items.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn detail(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    nav: Nav,
    Path(id): Path<String>,
) -> Result<OrderDetailTemplate> {
    let order_id: OrderId = parse_id(&id)?;
    let detail = OrderService::new(state.pool())
        .get_for_user(order_id, user.id)
        .await?;

    Ok(OrderDetailTemplate { nav, detail })
}

/// Cancel an order that has not shipped yet.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn cancel(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let order_id: OrderId = parse_id(&id)?;

    let target = match OrderService::new(state.pool())
        .cancel(order_id, user.id)
        .await?
    {
        CancelOutcome::Cancelled => {
            with_message("/orders", "info", &format!("Order #{order_id} cancelled."))
        }
        CancelOutcome::NotCancellable(status) => with_message(
            "/orders",
            "error",
            &format!(
                "Order #{order_id} is {} and can no longer be cancelled.",
                status.label()
            ),
        ),
    };

    Ok(Redirect::to(&target))
}

/// Printable invoice for one order.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn invoice(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<InvoiceTemplate> {
    let order_id: OrderId = parse_id(&id)?;
    let detail = OrderService::new(state.pool())
        .get_for_user(order_id, user.id)
        .await?;

    Ok(InvoiceTemplate { user, detail })
}
