//! Admin role management command.

use tracing::info;

use cedarmarket_api::db::UserRepository;
use cedarmarket_core::Email;

use super::{CommandError, connect};

/// Grant or revoke the admin role for a user, by email.
///
/// # Errors
///
/// Returns an error if the email is invalid, the user does not exist, or
/// the database operation fails.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let changed = UserRepository::new(&pool).set_admin(&email, is_admin).await?;
    if !changed {
        return Err(format!("no user with email {email}").into());
    }

    if is_admin {
        info!(%email, "admin role granted");
    } else {
        info!(%email, "admin role revoked");
    }
    Ok(())
}
