//! System email service for account-related mail.
//!
//! Sends verification-code emails using the SMTP configuration from the main
//! config file. When SMTP is not configured, sending is skipped with a
//! warning; codes are still persisted so local setups can read them from the
//! database or the logs.

use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;

/// Service for sending system emails
pub struct MailService {
    config: EmailConfig,
}

impl MailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Check if email sending is configured and enabled
    pub fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    /// Send the email verification code to a freshly registered user.
    pub async fn send_verification_code(
        &self,
        to_email: &str,
        name: &str,
        code: &str,
        expires_in_minutes: i64,
    ) -> Result<()> {
        if !self.is_enabled() {
            tracing::warn!(
                "Email not configured, skipping verification email to {}",
                to_email
            );
            return Ok(());
        }

        let subject = "Your Uniplan verification code".to_string();
        let html_body = render_verification_html(name, code, expires_in_minutes);
        let text_body = render_verification_text(name, code, expires_in_minutes);

        self.send_email(to_email, &subject, &html_body, &text_body)
            .await
    }

    /// Send an email with HTML and plain text versions
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<()> {
        let smtp_host = self
            .config
            .smtp_host
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;
        let from_address = self
            .config
            .from_address
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("From address not configured"))?;

        let from_mailbox = format!("{} <{}>", self.config.from_name, from_address);
        let from: Mailbox = from_mailbox.parse()?;
        let to: Mailbox = to_email.parse()?;

        let email = Message::builder()
            .from(from)
            .to(to)
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

        let mailer = if self.config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer
        };

        mailer.build().send(email).await?;

        tracing::info!("Sent verification email to {}", to_email);
        Ok(())
    }
}

fn render_verification_text(name: &str, code: &str, expires_in_minutes: i64) -> String {
    format!(
        "Hi {name},\n\n\
         your Uniplan verification code is: {code}\n\n\
         The code expires in {expires_in_minutes} minutes. If you did not\n\
         create a Uniplan account, you can ignore this email.\n"
    )
}

fn render_verification_html(name: &str, code: &str, expires_in_minutes: i64) -> String {
    format!(
        r#"<html>
  <body style="font-family: sans-serif; color: #1f2937;">
    <p>Hi {name},</p>
    <p>your Uniplan verification code is:</p>
    <p style="font-size: 28px; font-weight: bold; letter-spacing: 4px;">{code}</p>
    <p>The code expires in {expires_in_minutes} minutes.
       If you did not create a Uniplan account, you can ignore this email.</p>
  </body>
</html>"#
    )
}
