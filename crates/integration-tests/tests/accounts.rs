//! Registration, verification, login and profile edits.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;
use uuid::Uuid;

use smart_shop_integration_tests::{PASSWORD, config, count, user};
use smart_shop_storefront::config::AccountCreationPolicy;
use smart_shop_storefront::services::auth::{AuthError, AuthService, RegistrationOutcome};
use smart_shop_storefront::services::email::EmailService;

const SENDER: &str = "shop@example.com";

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn duplicate_username_or_email_is_rejected(pool: PgPool) {
    let config = config(AccountCreationPolicy::ImmediateActivation);
    let auth = AuthService::new(&pool, &config, None);
    user(&pool, "alice").await;

    let same_email = auth
        .register("alice2", "alice@example.com", PASSWORD)
        .await;
    assert!(matches!(same_email, Err(AuthError::UserAlreadyExists)));

    let same_name = auth.register("alice", "other@example.com", PASSWORD).await;
    assert!(matches!(same_name, Err(AuthError::UserAlreadyExists)));

    assert_eq!(count(&pool, "user").await, 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn login_accepts_username_or_email(pool: PgPool) {
    let config = config(AccountCreationPolicy::ImmediateActivation);
    let auth = AuthService::new(&pool, &config, None);
    let alice = user(&pool, "alice").await;

    assert_eq!(auth.login("alice", PASSWORD).await.unwrap().id, alice.id);
    assert_eq!(
        auth.login("alice@example.com", PASSWORD).await.unwrap().id,
        alice.id
    );
    assert!(matches!(
        auth.login("alice", "wrong-password").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.login("nobody", PASSWORD).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn verification_link_activates_once(pool: PgPool) {
    let config = config(AccountCreationPolicy::EmailVerificationRequired);
    let mailer = EmailService::accepting_stub(SENDER);
    let auth = AuthService::new(&pool, &config, Some(&mailer));

    let outcome = auth
        .register("bob", "bob@example.com", PASSWORD)
        .await
        .unwrap();
    let RegistrationOutcome::VerificationSent(bob) = outcome else {
        panic!("expected a verification email");
    };
    assert!(!bob.is_active);

    assert!(matches!(
        auth.login("bob", PASSWORD).await,
        Err(AuthError::AccountInactive)
    ));

    let token: Uuid = sqlx::query_scalar(
        "SELECT token FROM shop.email_verification_token WHERE user_id = $1",
    )
    .bind(bob.id.as_i32())
    .fetch_one(&pool)
    .await
    .unwrap();

    let verified = auth.verify(token).await.unwrap();
    assert!(verified.is_active);
    assert_eq!(auth.login("bob", PASSWORD).await.unwrap().id, bob.id);

    assert!(matches!(auth.verify(token).await, Err(AuthError::InvalidToken)));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn failed_verification_email_stores_nothing(pool: PgPool) {
    let config = config(AccountCreationPolicy::EmailVerificationRequired);
    let mailer = EmailService::failing_stub(SENDER);
    let auth = AuthService::new(&pool, &config, Some(&mailer));

    let result = auth.register("carol", "carol@example.com", PASSWORD).await;

    assert!(matches!(result, Err(AuthError::Email(_))));
    assert_eq!(count(&pool, "user").await, 0);
    assert_eq!(count(&pool, "email_verification_token").await, 0);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn password_change_requires_current_password(pool: PgPool) {
    let config = config(AccountCreationPolicy::ImmediateActivation);
    let auth = AuthService::new(&pool, &config, None);
    let dave = user(&pool, "dave").await;

    assert!(matches!(
        auth.change_password(dave.id, "not-it-at-all", "new-password-1", "new-password-1")
            .await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.change_password(dave.id, PASSWORD, "new-password-1", "new-password-2")
            .await,
        Err(AuthError::PasswordMismatch)
    ));

    auth.change_password(dave.id, PASSWORD, "new-password-1", "new-password-1")
        .await
        .unwrap();
    assert!(auth.login("dave", PASSWORD).await.is_err());
    assert!(auth.login("dave", "new-password-1").await.is_ok());
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "requires PostgreSQL"]
async fn profile_update_rejects_taken_email(pool: PgPool) {
    let config = config(AccountCreationPolicy::ImmediateActivation);
    let auth = AuthService::new(&pool, &config, None);
    let erin = user(&pool, "erin").await;
    user(&pool, "frank").await;

    assert!(matches!(
        auth.update_profile(erin.id, "frank@example.com", "", "").await,
        Err(AuthError::EmailTaken)
    ));

    let updated = auth
        .update_profile(erin.id, "erin@shop.test", " 555-0100 ", "3 Oak Ave")
        .await
        .unwrap();
    assert_eq!(updated.email.as_str(), "erin@shop.test");

    let profile = auth.profile(erin.id).await.unwrap();
    assert_eq!(profile.phone, "555-0100");
    assert_eq!(profile.address, "3 Oak Ave");
}
