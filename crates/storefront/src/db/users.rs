//! User repository for database operations.
//!
//! Usernames and emails are matched exactly (case-sensitive), mirroring the
//! unique constraints on `shop.user`.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use smart_shop_core::{Email, UserId, Username};

use super::RepositoryError;
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username =
            Username::parse(&row.username).map_err(|e| RepositoryError::corrupt("username", e))?;
        let email = Email::parse(&row.email).map_err(|e| RepositoryError::corrupt("email", e))?;

        Ok(Self {
            id: UserId::new(row.id),
            username,
            email,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, is_active, created_at, updated_at
            FROM shop.user
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by exact username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_hash_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, username, email, is_active, created_at, updated_at, password_hash
            FROM shop.user
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| -> Result<_, RepositoryError> {
            Ok((User::try_from(r.user)?, r.password_hash))
        })
        .transpose()
    }

    /// Get a user and their password hash by exact email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_hash_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, username, email, is_active, created_at, updated_at, password_hash
            FROM shop.user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| -> Result<_, RepositoryError> {
            Ok((User::try_from(r.user)?, r.password_hash))
        })
        .transpose()
    }

    /// Get the password hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn get_password_hash(&self, id: UserId) -> Result<String, RepositoryError> {
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM shop.user WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Whether an account already uses this exact username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_taken(&self, username: &str) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM shop.user WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    /// Whether another account already uses this exact email.
    ///
    /// `except` excludes the caller's own account when editing a profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_taken(
        &self,
        email: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM shop.user
                WHERE email = $1 AND ($2::INTEGER IS NULL OR id <> $2)
            )
            ",
        )
        .bind(email)
        .bind(except.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    /// Insert a new user inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        conn: &mut PgConnection,
        username: &Username,
        email: &Email,
        password_hash: &str,
        is_active: bool,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.user (username, email, password_hash, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, is_active, created_at, updated_at
            ",
        )
        .bind(username.as_str())
        .bind(email.as_str())
        .bind(password_hash)
        .bind(is_active)
        .fetch_one(conn)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "user"))?;

        User::try_from(row)
    }

    /// Mark a user active inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn activate(conn: &mut PgConnection, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.user SET is_active = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_i32())
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.user SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Change a user's email inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another account uses the email.
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_email(
        conn: &mut PgConnection,
        id: UserId,
        email: &Email,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.user SET email = $2, updated_at = NOW() WHERE id = $1")
                .bind(id.as_i32())
                .bind(email.as_str())
                .execute(conn)
                .await
                .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Total number of registered accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.user")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
