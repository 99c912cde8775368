//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `JWT_SECRET` - Token signing secret
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 5002)
//! - `CORS_ORIGINS` - Comma-separated allowed origins (default: local dev frontends)
//! - `EMAIL_HOST`, `EMAIL_PORT`, `EMAIL_USER`, `EMAIL_PASS`, `EMAIL_FROM` -
//!   SMTP settings; when `EMAIL_HOST` is unset, outbound email is disabled
//!   and contact responses are saved without sending anything.

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Default bind host.
const DEFAULT_HOST: &str = "127.0.0.1";
/// Default listen port.
const DEFAULT_PORT: u16 = 5002;
/// Default SMTP submission port.
const DEFAULT_SMTP_PORT: u16 = 587;
/// Default allowed CORS origins for local development frontends.
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// SMTP configuration; `None` disables outbound email
    pub email: Option<EmailConfig>,
}

/// SMTP configuration for outbound email.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = require("DATABASE_URL")?.into();
        let jwt_secret = require("JWT_SECRET")?.into();

        let host = parse_var("API_HOST", DEFAULT_HOST)?;
        let port = parse_var("API_PORT", &DEFAULT_PORT.to_string())?;

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_owned()),
        );

        let email = Self::email_from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            cors_origins,
            email,
        })
    }

    /// The socket address to bind the listener to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Load the SMTP block: absent entirely when `EMAIL_HOST` is unset.
    fn email_from_env() -> Result<Option<EmailConfig>, ConfigError> {
        let Ok(smtp_host) = std::env::var("EMAIL_HOST") else {
            return Ok(None);
        };

        let smtp_port = parse_var("EMAIL_PORT", &DEFAULT_SMTP_PORT.to_string())?;

        Ok(Some(EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username: require("EMAIL_USER")?,
            smtp_password: require("EMAIL_PASS")?.into(),
            from_address: require("EMAIL_FROM")?,
        }))
    }
}

/// Read a required environment variable.
fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

/// Read an optional environment variable and parse it, falling back to a
/// default string.
fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_owned());
    raw.parse()
        .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), raw))
}

/// Split a comma-separated origin list, dropping empty segments.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_splits_and_trims() {
        let origins = parse_origins("http://localhost:5173, https://shop.example.com ,");
        assert_eq!(
            origins,
            vec![
                "http://localhost:5173".to_owned(),
                "https://shop.example.com".to_owned(),
            ]
        );
    }

    #[test]
    fn test_parse_origins_empty_input() {
        assert!(parse_origins("").is_empty());
        assert!(parse_origins(" , ,").is_empty());
    }

    #[test]
    fn test_default_origins_parse() {
        assert_eq!(parse_origins(DEFAULT_CORS_ORIGINS).len(), 2);
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_owned(),
            smtp_port: 587,
            smtp_username: "mailer".to_owned(),
            smtp_password: SecretString::from("hunter2"),
            from_address: "noreply@example.com".to_owned(),
        };

        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
