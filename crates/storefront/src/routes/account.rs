//! Account route handlers: profile and password.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user};
use crate::middleware::{LOGIN_PATH, Nav, RequireAuth, clear_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::routes::{MessageQuery, with_message};
use crate::services::auth::{AuthError, AuthService};
use crate::services::notifications::NotificationService;
use crate::state::AppState;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Change password form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Change password template.
#[derive(Template, WebTemplate)]
#[template(path = "account/password.html")]
pub struct PasswordTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Render a form again with the error, or escalate infrastructure failures.
fn rejected(err: AuthError, page: impl IntoResponse) -> Result<Response> {
    if err.user_message().is_none() {
        return Err(err.into());
    }
    Ok((AppError::Auth(err).status(), page).into_response())
}

/// Display the profile. Opening it marks every notification read.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn profile_page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    mut nav: Nav,
    Query(query): Query<MessageQuery>,
) -> Result<ProfileTemplate> {
    let auth = AuthService::new(state.pool(), state.config(), state.email());
    let account = auth.get_user(user.id).await?;
    let profile = auth.profile(user.id).await?;

    NotificationService::new(state.pool())
        .mark_all_read(user.id)
        .await?;
    nav.unread_count = 0;
    nav.notifications.clear();

    Ok(ProfileTemplate {
        nav,
        username: account.username.to_string(),
        email: account.email.to_string(),
        phone: profile.phone,
        address: profile.address,
        error: query.error,
        info: query.info,
    })
}

/// Save email, phone and address.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    nav: Nav,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), state.config(), state.email());

    match auth
        .update_profile(user.id, &form.email, &form.phone, &form.address)
        .await
    {
        Ok(updated) => {
            session
                .insert(session_keys::CURRENT_USER, CurrentUser::from(&updated))
                .await?;
            Ok(Redirect::to(&with_message("/profile", "info", "Profile updated.")).into_response())
        }
        Err(err) => {
            let page = ProfileTemplate {
                nav,
                username: user.username.to_string(),
                email: form.email,
                phone: form.phone,
                address: form.address,
                error: err.user_message(),
                info: None,
            };
            rejected(err, page)
        }
    }
}

/// Display the change password form.
pub async fn password_page(RequireAuth(_user): RequireAuth, nav: Nav) -> PasswordTemplate {
    PasswordTemplate {
        nav,
        error: None,
        info: None,
    }
}

/// Change the password. Success ends the session; the customer logs in again.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    nav: Nav,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), state.config(), state.email());

    match auth
        .change_password(
            user.id,
            &form.current_password,
            &form.new_password,
            &form.confirm_password,
        )
        .await
    {
        Ok(()) => {
            clear_current_user(&session).await?;
            clear_sentry_user();
            Ok(Redirect::to(&with_message(
                LOGIN_PATH,
                "info",
                "Password changed. Please log in again.",
            ))
            .into_response())
        }
        Err(err) => {
            let page = PasswordTemplate {
                nav,
                error: err.user_message(),
                info: None,
            };
            rejected(err, page)
        }
    }
}
