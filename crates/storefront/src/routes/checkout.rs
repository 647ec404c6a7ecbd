//! Checkout route handlers.
//!
//! Cash-on-delivery orders are placed straight from the checkout form. Online
//! payments first create a payment order at the gateway and park the address
//! in the session; the order is placed when the customer returns to
//! `/payment/success`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use smart_shop_core::PaymentMethod;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{Nav, RequireAuth};
use crate::models::{CurrentUser, Order, PendingCheckout, session_keys};
use crate::routes::with_message;
use crate::services::auth::AuthService;
use crate::services::cart::{CartService, CartView, SessionCart};
use crate::services::checkout::{CheckoutError, CheckoutRequest, CheckoutService};
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub address: String,
    pub payment_method: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub nav: Nav,
    pub view: CartView,
    pub address: String,
    pub error: Option<String>,
    pub info: Option<String>,
}

fn invoice_redirect(order: &Order) -> Redirect {
    Redirect::to(&format!("/orders/{}/invoice", order.id))
}

/// Map checkout failures the customer can fix to a page they can act on.
async fn recover(
    err: CheckoutError,
    state: &AppState,
    cart: &SessionCart,
    nav: Nav,
    address: String,
) -> Result<Response> {
    match err {
        CheckoutError::MissingAddress => {
            let view = CartService::new(state.pool()).view(cart.cart()).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                CheckoutTemplate {
                    nav,
                    view,
                    address,
                    error: Some("Please enter a delivery address.".to_string()),
                    info: None,
                },
            )
                .into_response())
        }
        CheckoutError::InsufficientStock(product_id) => {
            tracing::info!(%product_id, "Checkout rejected for stock");
            Ok(Redirect::to(&with_message(
                "/cart",
                "error",
                "Some items are no longer available in the requested quantity.",
            ))
            .into_response())
        }
        other => Err(other.into()),
    }
}

/// Display the checkout form, prefilled with the saved address.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    nav: Nav,
) -> Result<Response> {
    let cart = SessionCart::load(&session).await?;
    if cart.cart().is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let view = CartService::new(state.pool()).view(cart.cart()).await?;
    let profile = AuthService::new(state.pool(), state.config(), state.email())
        .profile(user.id)
        .await?;

    Ok(CheckoutTemplate {
        nav,
        view,
        address: profile.address,
        error: None,
        info: None,
    }
    .into_response())
}

/// Handle the checkout form.
#[instrument(skip_all, fields(user_id = %user.id, method = %form.payment_method))]
pub async fn submit(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    nav: Nav,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let method: PaymentMethod = form
        .payment_method
        .parse()
        .map_err(|_| AppError::BadRequest("Unknown payment method".to_string()))?;

    let mut cart = SessionCart::load(&session).await?;

    let result = match method {
        PaymentMethod::Cod => place_cod(&state, &user, &mut cart, &form.address).await,
        PaymentMethod::Online => start_online(&state, &user, &session, &cart, &form.address).await,
    };

    match result {
        Ok(response) => Ok(response),
        Err(err) => recover(err, &state, &cart, nav, form.address).await,
    }
}

async fn place_cod(
    state: &AppState,
    user: &CurrentUser,
    cart: &mut SessionCart,
    address: &str,
) -> std::result::Result<Response, CheckoutError> {
    let order = CheckoutService::new(state.pool())
        .place_order(
            cart.cart(),
            CheckoutRequest {
                user_id: user.id,
                address,
                payment_method: PaymentMethod::Cod,
                payment_reference: None,
            },
        )
        .await?;

    cart.clear().await?;
    add_breadcrumb("checkout", "COD order placed", &[("order_id", &order.id.to_string())]);
    Ok(invoice_redirect(&order).into_response())
}

async fn start_online(
    state: &AppState,
    user: &CurrentUser,
    session: &Session,
    cart: &SessionCart,
    address: &str,
) -> std::result::Result<Response, CheckoutError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(CheckoutError::MissingAddress);
    }

    let plan = CheckoutService::new(state.pool()).plan(cart.cart()).await?;

    let gateway_order_id = match state.payment() {
        Some(gateway) => {
            let receipt = format!("user-{}", user.id);
            Some(gateway.create_order(plan.total, &receipt).await?.id)
        }
        None => None,
    };

    session
        .insert(
            session_keys::PENDING_CHECKOUT,
            PendingCheckout {
                address: address.to_string(),
                amount: plan.total,
                gateway_order_id,
            },
        )
        .await?;

    tracing::info!(amount = %plan.total, "Online payment started");
    Ok(Redirect::to("/payment/success").into_response())
}

/// Gateway return URL: place the parked online order.
///
/// Without a pending checkout the customer is sent back to the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn payment_success(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    nav: Nav,
) -> Result<Response> {
    let Some(pending) = session
        .remove::<PendingCheckout>(session_keys::PENDING_CHECKOUT)
        .await?
    else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let mut cart = SessionCart::load(&session).await?;

    let placed = CheckoutService::new(state.pool())
        .place_order(
            cart.cart(),
            CheckoutRequest {
                user_id: user.id,
                address: &pending.address,
                payment_method: PaymentMethod::Online,
                payment_reference: pending.gateway_order_id.as_deref(),
            },
        )
        .await;

    match placed {
        Ok(order) => {
            if order.total_amount != pending.amount {
                tracing::warn!(
                    order_id = %order.id,
                    paid = %pending.amount,
                    total = %order.total_amount,
                    "Cart changed during online payment"
                );
            }
            cart.clear().await?;
            add_breadcrumb("checkout", "Online order placed", &[("order_id", &order.id.to_string())]);
            Ok(invoice_redirect(&order).into_response())
        }
        Err(err) => recover(err, &state, &cart, nav, pending.address).await,
    }
}
