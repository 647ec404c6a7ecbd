//! Authentication service.
//!
//! Password registration and login, email verification, password change
//! and profile edits. Passwords are hashed with Argon2id.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use uuid::Uuid;

use smart_shop_core::{Email, UserId, Username};

use crate::config::{AccountCreationPolicy, StorefrontConfig};
use crate::db::{ProfileRepository, RepositoryError, UserRepository, VerificationRepository};
use crate::models::{Profile, User};
use crate::services::email::EmailService;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a successful registration.
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// The account can log in right away.
    Active(User),
    /// The account stays inactive until the emailed link is followed.
    VerificationSent(User),
}

impl RegistrationOutcome {
    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::Active(user) | Self::VerificationSent(user) => user,
        }
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
    config: &'a StorefrontConfig,
    email: Option<&'a EmailService>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// `email` is only needed under [`AccountCreationPolicy::EmailVerificationRequired`].
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        config: &'a StorefrontConfig,
        email: Option<&'a EmailService>,
    ) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
            config,
            email,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new account.
    ///
    /// Collisions are checked before any validation, so a duplicate username
    /// or email is always reported as [`AuthError::UserAlreadyExists`] and
    /// never inserts a row. Under the email verification policy the account
    /// is created inactive and the verification email is sent before the
    /// transaction commits: if sending fails, nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    /// Returns `AuthError::InvalidUsername` / `AuthError::InvalidEmail` on bad input.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::Email` if the verification email cannot be sent.
    #[tracing::instrument(skip(self, password), fields(username = %username.trim()))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegistrationOutcome, AuthError> {
        let username = username.trim();
        let email = email.trim();

        if self.users.username_taken(username).await?
            || self.users.email_taken(email, None).await?
        {
            return Err(AuthError::UserAlreadyExists);
        }

        let username = Username::parse(username)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let verification = match self.config.account_policy {
            AccountCreationPolicy::ImmediateActivation => None,
            AccountCreationPolicy::EmailVerificationRequired => {
                Some(self.email.ok_or(AuthError::MailerUnavailable)?)
            }
        };

        let password_hash = hash_password(password)?;

        let mut tx = self.pool.begin().await?;

        let user = UserRepository::insert(
            &mut tx,
            &username,
            &email,
            &password_hash,
            verification.is_none(),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        ProfileRepository::insert_empty(&mut tx, user.id).await?;

        let outcome = match verification {
            None => RegistrationOutcome::Active(user),
            Some(mailer) => {
                let token = VerificationRepository::issue(&mut tx, user.id).await?;
                let link = self.config.absolute_url(&format!("/verify/{token}"));
                mailer
                    .send_verification(user.email.as_str(), user.username.as_str(), &link)
                    .await?;
                RegistrationOutcome::VerificationSent(user)
            }
        };

        tx.commit().await?;

        tracing::info!(user_id = %outcome.user().id, "Account registered");
        Ok(outcome)
    }

    /// Activate the account a verification token was issued for.
    ///
    /// The token is deleted, so a second use fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for an unknown or already-used token.
    pub async fn verify(&self, token: Uuid) -> Result<User, AuthError> {
        let mut tx = self.pool.begin().await?;

        let user_id = VerificationRepository::consume(&mut tx, token)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        UserRepository::activate(&mut tx, user_id).await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, "Account verified");
        self.get_user(user_id).await
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Login with a username or email and a password.
    ///
    /// The identifier is tried as a username first, then as an email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no account matches or the password is wrong.
    /// Returns `AuthError::AccountInactive` if the password is right but the
    /// account has not been verified yet.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = identifier.trim();

        let found = match self.users.get_with_hash_by_username(identifier).await? {
            Some(found) => Some(found),
            None => self.users.get_with_hash_by_email(identifier).await?,
        };
        let (user, password_hash) = found.ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        Ok(user)
    }

    // =========================================================================
    // Account management
    // =========================================================================

    /// Change a user's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if `current` is wrong.
    /// Returns `AuthError::PasswordMismatch` if `new` and `confirm` differ.
    /// Returns `AuthError::WeakPassword` if `new` is too short.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        let stored = self.users.get_password_hash(user_id).await.map_err(|e| match e {
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        })?;
        verify_password(current, &stored)?;

        if new != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new)?;

        let password_hash = hash_password(new)?;
        self.users.update_password_hash(user_id, &password_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Update email, phone and address in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    /// Returns `AuthError::EmailTaken` if another account uses the email.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        email: &str,
        phone: &str,
        address: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email.trim())?;

        if self.users.email_taken(email.as_str(), Some(user_id)).await? {
            return Err(AuthError::EmailTaken);
        }

        let mut tx = self.pool.begin().await?;
        UserRepository::update_email(&mut tx, user_id, &email)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;
        ProfileRepository::save_contact(&mut tx, user_id, phone.trim(), address.trim()).await?;
        tx.commit().await?;

        self.get_user(user_id).await
    }

    /// A user's profile, created empty on first access.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn profile(&self, user_id: UserId) -> Result<Profile, AuthError> {
        let profile = ProfileRepository::new(self.pool).get_or_create(user_id).await?;
        Ok(profile)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
