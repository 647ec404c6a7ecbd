//! Informational page handlers.
//!
//! Serves the markdown pages loaded at startup: privacy policy, terms,
//! shipping and refund policies, contact.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::NaiveDate;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::Nav;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub nav: Nav,
    pub title: String,
    pub description: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

/// Serve the page registered under `slug`.
///
/// # Errors
///
/// Returns 404 if the page was not loaded.
#[instrument(skip(state, nav))]
pub async fn show(
    State(state): State<AppState>,
    nav: Nav,
    slug: &'static str,
) -> Result<ContentPageTemplate> {
    let page = state
        .content()
        .get_page(slug)
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))?;

    Ok(ContentPageTemplate {
        nav,
        title: page.meta.title.clone(),
        description: page.meta.description.clone().unwrap_or_default(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    })
}
