//! Email service for account verification mail.
//!
//! Uses SMTP via lettre for delivery with Askama text and HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
    transport::stub::AsyncStubTransport,
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the verification email.
#[derive(Template)]
#[template(path = "email/verify_account.html")]
struct VerifyAccountEmailHtml<'a> {
    username: &'a str,
    link: &'a str,
}

/// Plain text template for the verification email.
#[derive(Template)]
#[template(path = "email/verify_account.txt")]
struct VerifyAccountEmailText<'a> {
    username: &'a str,
    link: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Non-SMTP transport refused the message.
    #[error("transport error: {0}")]
    Transport(String),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Clone)]
enum Mailer {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Stub(AsyncStubTransport),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Mailer,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer: Mailer::Smtp(mailer),
            from_address: config.from_address.clone(),
        })
    }

    /// An email service that accepts every message without sending it.
    #[must_use]
    pub fn accepting_stub(from_address: &str) -> Self {
        Self {
            mailer: Mailer::Stub(AsyncStubTransport::new_ok()),
            from_address: from_address.to_string(),
        }
    }

    /// An email service whose every send fails.
    #[must_use]
    pub fn failing_stub(from_address: &str) -> Self {
        Self {
            mailer: Mailer::Stub(AsyncStubTransport::new_error()),
            from_address: from_address.to_string(),
        }
    }

    /// Send the account verification link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification(
        &self,
        to: &str,
        username: &str,
        link: &str,
    ) -> Result<(), EmailError> {
        let html = VerifyAccountEmailHtml { username, link }.render()?;
        let text = VerifyAccountEmailText { username, link }.render()?;

        self.send_multipart_email(to, "Verify your Smart Shop account", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        match &self.mailer {
            Mailer::Smtp(smtp) => {
                smtp.send(email).await?;
            }
            Mailer::Stub(stub) => {
                stub.send(email)
                    .await
                    .map_err(|e| EmailError::Transport(e.to_string()))?;
            }
        }

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_templates_include_link() {
        let link = "http://localhost:8000/verify/0b6d3c1e-5d0c-4b8e-9f57-3f1f4f0b8a11";
        let text = VerifyAccountEmailText {
            username: "asha",
            link,
        }
        .render()
        .unwrap();
        let html = VerifyAccountEmailHtml {
            username: "asha",
            link,
        }
        .render()
        .unwrap();

        assert!(text.contains(link));
        assert!(text.contains("asha"));
        assert!(html.contains(link));
    }

    #[tokio::test]
    async fn test_stub_transports() {
        let ok = EmailService::accepting_stub("shop@smartshop.test");
        ok.send_verification("buyer@smartshop.test", "buyer", "http://x/verify/1")
            .await
            .unwrap();

        let failing = EmailService::failing_stub("shop@smartshop.test");
        let err = failing
            .send_verification("buyer@smartshop.test", "buyer", "http://x/verify/1")
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::Transport(_)));
    }

    #[tokio::test]
    async fn test_invalid_recipient() {
        let ok = EmailService::accepting_stub("shop@smartshop.test");
        let err = ok
            .send_verification("not an address", "buyer", "http://x/verify/1")
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::InvalidAddress(_)));
    }
}
