//! Email service for registration OTPs and welcome mail.
//!
//! Uses SMTP via lettre for delivery with Askama templates for the bodies.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the registration OTP email.
#[derive(Template)]
#[template(path = "email/otp_code.html")]
struct OtpCodeEmailHtml<'a> {
    name: &'a str,
    code: &'a str,
    ttl_minutes: u64,
}

/// Plain text template for the registration OTP email.
#[derive(Template)]
#[template(path = "email/otp_code.txt")]
struct OtpCodeEmailText<'a> {
    name: &'a str,
    code: &'a str,
    ttl_minutes: u64,
}

/// HTML template for the welcome email.
#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    name: &'a str,
}

/// Plain text template for the welcome email.
#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    name: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

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

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay configuration is invalid.
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
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the registration OTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails to render or send.
    pub async fn send_otp_code(
        &self,
        to: &str,
        name: &str,
        code: &str,
        ttl_minutes: u64,
    ) -> Result<(), EmailError> {
        let html = OtpCodeEmailHtml {
            name,
            code,
            ttl_minutes,
        }
        .render()?;
        let text = OtpCodeEmailText {
            name,
            code,
            ttl_minutes,
        }
        .render()?;

        self.send_multipart_email(to, "Your Clove verification code", &text, &html)
            .await
    }

    /// Send the post-registration welcome mail.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails to render or send.
    pub async fn send_welcome(&self, to: &str, name: &str) -> Result<(), EmailError> {
        let html = WelcomeEmailHtml { name }.render()?;
        let text = WelcomeEmailText { name }.render()?;

        self.send_multipart_email(to, "Welcome to Clove", &text, &html)
            .await
    }

    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_owned()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_owned()),
                    ),
            )?;

        self.mailer.send(message).await?;
        Ok(())
    }
}
