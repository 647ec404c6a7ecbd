//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] smart_shop_core::EmailError),

    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] smart_shop_core::UsernameError),

    /// Unknown identifier or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Correct password, but the account has not been activated.
    #[error("account is not active")]
    AccountInactive,

    /// Username or email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Email already used by another account (profile edit).
    #[error("email already in use")]
    EmailTaken,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// New password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Unknown or already-used verification token.
    #[error("verification link is invalid or has already been used")]
    InvalidToken,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Email verification is required but no mailer is configured.
    #[error("email delivery is not configured")]
    MailerUnavailable,

    /// Sending the verification email failed.
    #[error("email error: {0}")]
    Email(#[from] EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

impl AuthError {
    /// Message suitable for showing next to a form.
    ///
    /// Returns `None` for infrastructure errors, which must not be echoed.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        let message = match self {
            Self::InvalidEmail(_) => "Enter a valid email address".to_string(),
            Self::InvalidUsername(e) => e.to_string(),
            Self::InvalidCredentials => "Invalid username/email or password".to_string(),
            Self::AccountInactive => {
                "Your account is not active yet. Check your email for the verification link."
                    .to_string()
            }
            Self::UserAlreadyExists => "User already exists".to_string(),
            Self::EmailTaken => "That email is already used by another account".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::PasswordMismatch => "New passwords do not match".to_string(),
            Self::InvalidToken => self.to_string(),
            Self::UserNotFound
            | Self::MailerUnavailable
            | Self::Email(_)
            | Self::Repository(_)
            | Self::PasswordHash => return None,
        };
        Some(message)
    }
}
