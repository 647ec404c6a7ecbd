//! Cart route handlers.
//!
//! The cart lives in the session. Mutations redirect back to a page; an
//! out-of-stock product sends the customer to its detail page with an error.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use tower_sessions::Session;
use tracing::instrument;

use smart_shop_core::{CartError, CartUpdate, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{Nav, RequireAuth};
use crate::routes::{MessageQuery, parse_id, with_message};
use crate::services::cart::{CartService, CartServiceError, CartView, SessionCart};
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub nav: Nav,
    pub view: CartView,
    pub error: Option<String>,
    pub info: Option<String>,
}

const OUT_OF_STOCK: &str = "Sorry, this product is out of stock.";

/// Where to send the customer when a cart mutation fails on stock.
fn out_of_stock_redirect(product_id: ProductId) -> Redirect {
    Redirect::to(&with_message(
        &format!("/product/{product_id}"),
        "error",
        OUT_OF_STOCK,
    ))
}

/// Display the cart page.
#[instrument(skip_all)]
pub async fn show(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    nav: Nav,
    Query(query): Query<MessageQuery>,
) -> Result<CartTemplate> {
    let cart = SessionCart::load(&session).await?;
    let view = CartService::new(state.pool()).view(cart.cart()).await?;

    Ok(CartTemplate {
        nav,
        view,
        error: query.error,
        info: query.info,
    })
}

/// Add one unit of a product.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn add(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let product_id: ProductId = parse_id(&id)?;
    let mut cart = SessionCart::load(&session).await?;

    match CartService::new(state.pool())
        .add(cart.cart_mut(), product_id)
        .await
    {
        Ok(quantity) => {
            cart.save().await?;
            add_breadcrumb(
                "cart",
                "Added to cart",
                &[("product_id", &id), ("quantity", &quantity.to_string())],
            );
            Ok(Redirect::to("/cart"))
        }
        Err(CartServiceError::Cart(CartError::OutOfStock(_))) => {
            Ok(out_of_stock_redirect(product_id))
        }
        Err(e) => Err(e.into()),
    }
}

/// Replace the cart with one unit of a product and go to checkout.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn buy_now(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let product_id: ProductId = parse_id(&id)?;
    let mut cart = SessionCart::load(&session).await?;

    match CartService::new(state.pool())
        .buy_now(cart.cart_mut(), product_id)
        .await
    {
        Ok(()) => {
            cart.save().await?;
            Ok(Redirect::to("/checkout"))
        }
        Err(CartServiceError::Cart(CartError::OutOfStock(_))) => {
            Ok(out_of_stock_redirect(product_id))
        }
        Err(e) => Err(e.into()),
    }
}

/// Increase or decrease a cart line.
#[instrument(skip_all, fields(product_id = %id, action = %action))]
pub async fn update(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path((id, action)): Path<(String, String)>,
) -> Result<Redirect> {
    let product_id: ProductId = parse_id(&id)?;
    let action: CartUpdate = action.parse().map_err(AppError::NotFound)?;

    let mut cart = SessionCart::load(&session).await?;
    CartService::new(state.pool())
        .update(cart.cart_mut(), product_id, action)
        .await?;

    cart.save().await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a line from the cart.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn remove(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let product_id: ProductId = parse_id(&id)?;
    let mut cart = SessionCart::load(&session).await?;

    if cart.cart_mut().remove(product_id) {
        cart.save().await?;
    }
    Ok(Redirect::to("/cart"))
}
