//! Authentication route handlers.
//!
//! Handles login by username or email, registration with optional email
//! verification, and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{LOGIN_PATH, Nav, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::{MessageQuery, with_message};
use crate::services::auth::{AuthError, AuthService, RegistrationOutcome};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data. `username` accepts a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub username: String,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Shown after registering when the account waits for email verification.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_sent.html")]
pub struct VerifySentTemplate {
    pub nav: Nav,
    pub email: String,
}

/// Split an auth failure into form feedback or a hard error.
fn form_feedback(err: AuthError) -> Result<(StatusCode, String)> {
    match err.user_message() {
        Some(message) => Ok((AppError::Auth(err).status(), message)),
        None => Err(err.into()),
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(nav: Nav, Query(query): Query<MessageQuery>) -> Response {
    if nav.user.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        nav,
        username: String::new(),
        error: query.error,
        info: query.info,
    }
    .into_response()
}

/// Handle login form submission.
#[tracing::instrument(skip_all, fields(identifier = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    nav: Nav,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), state.config(), state.email());

    match auth.login(&form.username, &form.password).await {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            add_breadcrumb("auth", "Logged in", &[]);
            tracing::info!(user_id = %user.id, "User logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(err) => {
            let (status, message) = form_feedback(err)?;
            tracing::info!(%status, "Login rejected");
            Ok((
                status,
                LoginTemplate {
                    nav,
                    username: form.username,
                    error: Some(message),
                    info: None,
                },
            )
                .into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(nav: Nav, Query(query): Query<MessageQuery>) -> Response {
    if nav.user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        nav,
        username: String::new(),
        email: String::new(),
        error: query.error,
        info: query.info,
    }
    .into_response()
}

/// Handle registration form submission.
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    nav: Nav,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), state.config(), state.email());

    match auth
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(RegistrationOutcome::Active(_)) => Ok(Redirect::to(&with_message(
            LOGIN_PATH,
            "info",
            "Account created. Please log in.",
        ))
        .into_response()),
        Ok(RegistrationOutcome::VerificationSent(user)) => Ok(VerifySentTemplate {
            nav,
            email: user.email.to_string(),
        }
        .into_response()),
        Err(err) => {
            let (status, message) = form_feedback(err)?;
            Ok((
                status,
                RegisterTemplate {
                    nav,
                    username: form.username,
                    email: form.email,
                    error: Some(message),
                    info: None,
                },
            )
                .into_response())
        }
    }
}

/// Follow an email verification link.
pub async fn verify(State(state): State<AppState>, Path(token): Path<String>) -> Result<Redirect> {
    let token = Uuid::parse_str(&token)
        .map_err(|_| AppError::NotFound("verification token".to_string()))?;

    let auth = AuthService::new(state.pool(), state.config(), state.email());
    let user = auth.verify(token).await?;
    tracing::info!(user_id = %user.id, "Account verified");

    Ok(Redirect::to(&with_message(
        LOGIN_PATH,
        "info",
        "Your email is verified. You can now log in.",
    )))
}

// =============================================================================
// Logout
// =============================================================================

/// Log out and drop the session, cart included.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to(LOGIN_PATH))
}
