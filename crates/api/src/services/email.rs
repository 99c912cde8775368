//! Email service for outbound transactional mail.
//!
//! Uses SMTP via lettre. The only message this system sends is the reply
//! to a contact-form submission; bodies are plain text. Callers treat a
//! send failure as a logged warning, never as a request failure.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use cedarmarket_core::Email;

use crate::config::EmailConfig;

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
}

/// Email service for sending transactional emails.
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
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
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

    /// Send the reply to a contact-form message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or SMTP delivery
    /// fails. Callers log and swallow this: an email failure must never
    /// roll back the contact update that triggered it.
    pub async fn send_contact_response(
        &self,
        to: &Email,
        name: &str,
        original_message: &str,
        response: &str,
    ) -> Result<(), EmailError> {
        let body = contact_response_body(name, original_message, response);

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject("Re: Your message to CedarMarket")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.mailer.send(message).await?;
        tracing::info!(to = %to, "contact response email sent");
        Ok(())
    }
}

/// Render the plain-text body of a contact response.
fn contact_response_body(name: &str, original_message: &str, response: &str) -> String {
    format!(
        "Hello {name},\n\n\
         Thank you for contacting CedarMarket. We appreciate your message.\n\n\
         You wrote:\n{original_message}\n\n\
         Here's our response:\n{response}\n\n\
         If you have any further questions, please don't hesitate to contact us again.\n\n\
         Best regards,\n\
         CedarMarket Support\n\n\
         This is an automated response to your inquiry. Please do not reply to this email.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_includes_both_messages() {
        let body = contact_response_body("Rami", "Where is my order?", "On its way.");

        assert!(body.starts_with("Hello Rami,"));
        assert!(body.contains("Where is my order?"));
        assert!(body.contains("On its way."));
    }
}
