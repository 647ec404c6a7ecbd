//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::services::email::EmailService;
use crate::services::payment::PaymentGateway;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    content: ContentStore,
    email: Option<EmailService>,
    payment: Option<PaymentGateway>,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// Loads content pages and builds the SMTP and payment clients when
    /// they are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if content cannot be read or the SMTP relay is invalid.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let content = ContentStore::load(&config.content_dir)?;
        let email = config.email.as_ref().map(EmailService::new).transpose()?;
        let payment = config.payment.clone().map(PaymentGateway::new);

        if payment.is_none() {
            tracing::warn!("No payment gateway configured; online checkouts skip the gateway");
        }

        Ok(Self::from_parts(config, pool, content, email, payment))
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        pool: PgPool,
        content: ContentStore,
        email: Option<EmailService>,
        payment: Option<PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                content,
                email,
                payment,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the loaded content pages.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Payment gateway client, if credentials are configured.
    #[must_use]
    pub fn payment(&self) -> Option<&PaymentGateway> {
        self.inner.payment.as_ref()
    }
}
