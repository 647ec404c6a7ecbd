//! Notification center handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::Redirect,
};

use smart_shop_core::NotificationId;

use crate::error::Result;
use crate::middleware::{Nav, RequireAuth};
use crate::models::Notification;
use crate::routes::parse_id;
use crate::services::notifications::NotificationService;
use crate::state::AppState;

const NOTIFICATIONS_PATH: &str = "/notifications";

/// Notification list template.
#[derive(Template, WebTemplate)]
#[template(path = "notifications.html")]
pub struct NotificationsTemplate {
    pub nav: Nav,
    pub notifications: Vec<Notification>,
}

/// Display every notification, newest first.
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    nav: Nav,
) -> Result<NotificationsTemplate> {
    let notifications = NotificationService::new(state.pool()).list(user.id).await?;
    Ok(NotificationsTemplate { nav, notifications })
}

pub async fn read(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id: NotificationId = parse_id(&id)?;
    NotificationService::new(state.pool())
        .mark_read(user.id, id)
        .await?;
    Ok(Redirect::to(NOTIFICATIONS_PATH))
}

pub async fn read_all(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let count = NotificationService::new(state.pool())
        .mark_all_read(user.id)
        .await?;
    tracing::debug!(user_id = %user.id, count, "Marked notifications read");
    Ok(Redirect::to(NOTIFICATIONS_PATH))
}

pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id: NotificationId = parse_id(&id)?;
    NotificationService::new(state.pool())
        .delete(user.id, id)
        .await?;
    Ok(Redirect::to(NOTIFICATIONS_PATH))
}

/// Delete every notification of the customer.
pub async fn clear(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let count = NotificationService::new(state.pool()).clear(user.id).await?;
    tracing::debug!(user_id = %user.id, count, "Cleared notifications");
    Ok(Redirect::to(NOTIFICATIONS_PATH))
}
