//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;
pub mod users;

use secrecy::SecretString;
use sqlx::PgPool;

/// Shared command error type.
pub type CommandError = Box<dyn std::error::Error>;

/// Connect to the database named by `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "DATABASE_URL not set")?;

    Ok(cedarmarket_api::db::create_pool(&database_url).await?)
}
