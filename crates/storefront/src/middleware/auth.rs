//! Authentication extractors and the per-page navigation context.
//!
//! The logged-in user is stored in the session under
//! [`session_keys::CURRENT_USER`]. Every shop page except login,
//! registration, verification, static pages and health checks requires it.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, Notification, session_keys};
use crate::services::cart::SessionCart;
use crate::services::notifications::NotificationService;
use crate::state::AppState;

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a logged-in user.
///
/// If nobody is logged in, the request is redirected to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders of {}", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection when authentication is required but nobody is logged in.
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// The session layer is missing from the stack.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::MissingSession => {
                tracing::error!("Session layer missing; cannot authenticate request");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToLogin)?;

        Ok(Self(user))
    }
}

/// Data every page shows in its navigation bar.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub user: Option<CurrentUser>,
    /// Total units in the session cart.
    pub cart_count: u32,
    pub unread_count: i64,
    /// Latest unread notifications for the dropdown.
    pub notifications: Vec<Notification>,
}

impl FromRequestParts<AppState> for Nav {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self::default());
        };

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let cart_count = SessionCart::load(&session).await?.cart().total_quantity();

        let Some(user) = user else {
            return Ok(Self {
                cart_count,
                ..Self::default()
            });
        };

        let summary = NotificationService::new(state.pool()).summary(user.id).await?;

        Ok(Self {
            user: Some(user),
            cart_count,
            unread_count: summary.unread_count,
            notifications: summary.latest_unread,
        })
    }
}

/// Log a user in: rotate the session ID and store the user.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log out: drop the whole session, cart included.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
