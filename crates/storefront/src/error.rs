//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Missing and foreign resources both answer with the same generic 404, so a
//! customer cannot probe for other customers' orders.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartServiceError;
use crate::services::checkout::CheckoutError;
use crate::services::orders::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartServiceError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const NOT_FOUND_MESSAGE: &str = "Page not found";
const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound)
            | Self::NotFound(_)
            | Self::Order(OrderError::NotFound)
            | Self::Cart(CartServiceError::ProductNotFound(_))
            | Self::Checkout(CheckoutError::ProductNotFound(_))
            | Self::Auth(AuthError::InvalidToken | AuthError::UserNotFound) => {
                StatusCode::NOT_FOUND
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::AccountInactive => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists | AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Cart(CartServiceError::Cart(_))
            | Self::Checkout(CheckoutError::InsufficientStock(_))
            | Self::Order(OrderError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            Self::Checkout(CheckoutError::EmptyCart) => StatusCode::SEE_OTHER,
            Self::Checkout(CheckoutError::MissingAddress) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Checkout(CheckoutError::Payment(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // An empty cart at checkout is routine: send the customer back to the cart.
        if matches!(self, Self::Checkout(CheckoutError::EmptyCart)) {
            return Redirect::to("/cart").into_response();
        }

        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            _ if status == StatusCode::NOT_FOUND => NOT_FOUND_MESSAGE.to_string(),
            _ if status.is_server_error() => INTERNAL_MESSAGE.to_string(),
            Self::Auth(err) => err
                .user_message()
                .unwrap_or_else(|| INTERNAL_MESSAGE.to_string()),
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Order(err) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
