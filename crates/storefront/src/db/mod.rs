//! Database operations for the shop `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `shop.category`, `shop.product` - Catalog
//! - `shop.user`, `shop.user_profile` - Accounts and contact details
//! - `shop.email_verification_token` - Pending account activations
//! - `shop.order`, `shop.order_item` - Placed orders with price snapshots
//! - `shop.notification` - Per-user notification feed
//! - `tower_sessions.session` - Tower-sessions storage (cart lives here)
//!
//! Queries use runtime-checked `sqlx::query_as` with `FromRow` row structs,
//! which are converted into domain models via `TryFrom`. Enum columns are
//! stored as `TEXT`; a value that fails to parse is reported as
//! [`RepositoryError::DataCorruption`].
//!
//! Repositories borrow the pool for standalone reads and writes. Operations
//! that must share a transaction are associated functions taking a
//! `&mut PgConnection`, so the calling service owns `begin`/`commit`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p smart-shop-cli -- migrate
//! ```

pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod profiles;
pub mod users;
pub mod verification;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use profiles::ProfileRepository;
pub use users::UserRepository;
pub use verification::VerificationRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_insert(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }

    /// Build a `DataCorruption` error for a column that failed to parse.
    pub(crate) fn corrupt(column: &str, err: impl std::fmt::Display) -> Self {
        Self::DataCorruption(format!("invalid {column} in database: {err}"))
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
