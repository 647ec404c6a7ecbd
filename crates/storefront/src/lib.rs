//! Smart Shop storefront library.
//!
//! This crate provides the storefront functionality as a library, so the
//! binary, the CLI and the tests share one router and one service layer.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request, middleware::from_fn};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::state::AppState;

/// Build the storefront application around a session store.
///
/// Production passes the `PostgreSQL` store; tests pass a `MemoryStore`.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(store, &state.config().base_url);
    let static_dir = state.config().static_dir.clone();

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::tests::test_config;
    use crate::content::ContentStore;

    fn test_app() -> Router {
        let config = test_config();
        let content = ContentStore::load(&config.content_dir).unwrap();
        // Never connected: these requests do not reach the database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://shop@localhost/unused")
            .unwrap();
        let state = AppState::from_parts(config, pool, content, None, None);
        app(state, MemoryStore::default())
    }

    fn get(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10")
            .body(Body::empty())
            .unwrap()
    }

    fn post(uri: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_shop_pages_redirect_to_login() {
        for uri in ["/", "/cart", "/checkout", "/orders", "/orders/1", "/profile", "/notifications"] {
            let response = test_app().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_cart_mutations_redirect_to_login() {
        let response = test_app().oneshot(post("/cart/add/7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = test_app().oneshot(get("/login")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("name=\"username\""));
        assert!(body.contains("action=\"/login\""));
    }

    #[tokio::test]
    async fn test_login_page_shows_info_message() {
        let response = test_app()
            .oneshot(get("/login?info=Account%20created."))
            .await
            .unwrap();
        assert!(body_text(response).await.contains("Account created."));
    }

    #[tokio::test]
    async fn test_register_page_renders() {
        let response = test_app().oneshot(get("/register")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("name=\"email\""));
    }

    #[tokio::test]
    async fn test_static_pages_are_public() {
        let response = test_app().oneshot(get("/shipping-policy")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Shipping Policy"));

        let response = test_app().oneshot(get("/contact")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_app().oneshot(get("/no-such-page")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_verification_token_is_404() {
        let response = test_app().oneshot(get("/verify/not-a-uuid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_redirects_to_login() {
        let response = test_app().oneshot(post("/logout")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_responses_carry_security_headers_and_request_id() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        let headers = response.headers();
        assert!(headers.contains_key("content-security-policy"));
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let response = test_app().oneshot(get("/static/css/shop.css")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
