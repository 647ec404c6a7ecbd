//! User profile repository.
//!
//! A profile row is created at registration, and lazily for accounts that
//! predate it, so every write here is an upsert.

use sqlx::{PgConnection, PgPool};

use smart_shop_core::UserId;

use super::RepositoryError;
use crate::models::Profile;

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: i32,
    phone: String,
    address: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            phone: row.phone,
            address: row.address,
        }
    }
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's profile, creating an empty one if it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO shop.user_profile (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, phone, address
            ",
        )
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(Profile::from(row))
    }

    /// Create an empty profile inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert_empty(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shop.user_profile (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id.as_i32())
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Overwrite phone and address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save_contact(
        conn: &mut PgConnection,
        user_id: UserId,
        phone: &str,
        address: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.user_profile (user_id, phone, address)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET phone = EXCLUDED.phone, address = EXCLUDED.address
            ",
        )
        .bind(user_id.as_i32())
        .bind(phone)
        .bind(address)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Record the latest delivery address (last write wins).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save_address(
        conn: &mut PgConnection,
        user_id: UserId,
        address: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.user_profile (user_id, address)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET address = EXCLUDED.address
            ",
        )
        .bind(user_id.as_i32())
        .bind(address)
        .execute(conn)
        .await?;
        Ok(())
    }
}
