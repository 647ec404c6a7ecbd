//! Command implementations.

pub mod migrate;
pub mod orders;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use smart_shop_storefront::db::{self, RepositoryError};
use smart_shop_storefront::services::orders::OrderError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Catalog file parsed but failed validation.
    #[error("{0} catalog validation errors found")]
    InvalidCatalog(usize),
}

/// Connect to the shop database named by `SHOP_DATABASE_URL` or `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SHOP_DATABASE_URL"))?;

    tracing::info!("Connecting to shop database...");
    Ok(db::create_pool(&database_url).await?)
}
