//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (database)
//!
//! # Auth (rate limited)
//! GET  /login                          - Login page
//! POST /login                          - Login action (username or email)
//! GET  /register                       - Register page
//! POST /register                       - Register action
//! POST /logout                         - Logout action
//! GET  /verify/{token}                 - Email verification link
//!
//! # Catalog (requires auth)
//! GET  /                               - All products
//! GET  /category/{slug}                - Products of one category
//! GET  /product/{id}                   - Product detail
//!
//! # Cart (requires auth)
//! GET  /cart                           - Cart page
//! POST /cart/add/{id}                  - Add one unit
//! POST /cart/buy-now/{id}              - Replace the cart and go to checkout
//! POST /cart/update/{id}/{action}      - increase | decrease
//! POST /cart/remove/{id}               - Remove a line
//!
//! # Checkout (requires auth)
//! GET  /checkout                       - Address and payment form
//! POST /checkout                       - Place a COD order or start an online payment
//! GET  /payment/success                - Gateway return URL
//!
//! # Orders (requires auth)
//! GET  /orders                         - Order history
//! GET  /orders/{id}                    - Order detail
//! POST /orders/{id}/cancel             - Cancel while PLACED or CONFIRMED
//! GET  /orders/{id}/invoice            - Printable invoice
//!
//! # Account (requires auth)
//! GET  /profile                        - Profile page (marks notifications read)
//! POST /profile                        - Update email, phone, address
//! GET  /password                       - Change password page
//! POST /password                       - Change password (logs out)
//!
//! # Notifications (requires auth)
//! GET  /notifications                  - All notifications
//! POST /notifications/{id}/read        - Mark one read
//! POST /notifications/read-all         - Mark all read
//! POST /notifications/{id}/delete      - Delete one
//! POST /notifications/clear            - Delete all
//!
//! # Pages
//! GET  /privacy-policy, /terms, /shipping-policy, /refund-policy, /contact
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod notifications;
pub mod orders;
pub mod pages;

use std::str::FromStr;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::content::PAGE_SLUGS;
use crate::error::AppError;
use crate::middleware::{Nav, auth_rate_limiter};
use crate::state::AppState;

/// Flash-style messages carried in the query string after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Parse an ID from a path segment. Garbage answers with 404.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("invalid id: {raw}")))
}

/// Build a redirect target with a URL-encoded query message.
pub(crate) fn with_message(path: &str, key: &str, message: &str) -> String {
    format!("{path}?{key}={}", urlencoding::encode(message))
}

/// Login and registration, behind the auth rate limiter when it builds.
fn auth_routes() -> Router<AppState> {
    let router = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register));

    match auth_rate_limiter() {
        Some(limiter) => router.route_layer(limiter),
        None => {
            tracing::warn!("Auth rate limiter could not be built; running without it");
            router
        }
    }
}

fn page_routes() -> Router<AppState> {
    PAGE_SLUGS.iter().fold(Router::new(), |router, &slug| {
        router.route(
            &format!("/{slug}"),
            get(move |state: State<AppState>, nav: Nav| pages::show(state, nav, slug)),
        )
    })
}

/// Create the full route tree.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth_routes())
        .route("/logout", post(auth::logout))
        .route("/verify/{token}", get(auth::verify))
        // Catalog
        .route("/", get(catalog::home))
        .route("/category/{slug}", get(catalog::category))
        .route("/product/{id}", get(catalog::product))
        // Cart
        .route("/cart", get(cart::show))
        .route("/cart/add/{id}", post(cart::add))
        .route("/cart/buy-now/{id}", post(cart::buy_now))
        .route("/cart/update/{id}/{action}", post(cart::update))
        .route("/cart/remove/{id}", post(cart::remove))
        // Checkout
        .route("/checkout", get(checkout::page).post(checkout::submit))
        .route("/payment/success", get(checkout::payment_success))
        // Orders
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::detail))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/orders/{id}/invoice", get(orders::invoice))
        // Account
        .route("/profile", get(account::profile_page).post(account::update_profile))
        .route("/password", get(account::password_page).post(account::change_password))
        // Notifications
        .route("/notifications", get(notifications::list))
        .route("/notifications/read-all", post(notifications::read_all))
        .route("/notifications/clear", post(notifications::clear))
        .route("/notifications/{id}/read", post(notifications::read))
        .route("/notifications/{id}/delete", post(notifications::delete))
        .merge(page_routes())
}

/// Liveness check.
async fn health() -> impl IntoResponse {
    "ok"
}

/// Readiness check: the database must answer.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
