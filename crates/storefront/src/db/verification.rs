//! Email verification token repository.
//!
//! One outstanding token per user; tokens are deleted once used.

use sqlx::PgConnection;
use uuid::Uuid;

use smart_shop_core::UserId;

use super::RepositoryError;

/// Repository for email verification tokens.
///
/// All operations run inside the caller's transaction.
pub struct VerificationRepository;

impl VerificationRepository {
    /// Issue a fresh token for a user, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn issue(conn: &mut PgConnection, user_id: UserId) -> Result<Uuid, RepositoryError> {
        let token = Uuid::new_v4();
        sqlx::query(
            r"
            INSERT INTO shop.email_verification_token (user_id, token)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET token = EXCLUDED.token, created_at = NOW()
            ",
        )
        .bind(user_id.as_i32())
        .bind(token)
        .execute(conn)
        .await?;
        Ok(token)
    }

    /// Delete a token and return the user it belonged to.
    ///
    /// Returns `None` for an unknown or already-used token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(
        conn: &mut PgConnection,
        token: Uuid,
    ) -> Result<Option<UserId>, RepositoryError> {
        let user_id = sqlx::query_scalar::<_, i32>(
            "DELETE FROM shop.email_verification_token WHERE token = $1 RETURNING user_id",
        )
        .bind(token)
        .fetch_optional(conn)
        .await?;

        Ok(user_id.map(UserId::new))
    }
}
