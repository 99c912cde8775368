//! User inspection command.

use tracing::info;

use cedarmarket_api::db::UserRepository;

use super::{CommandError, connect};

/// List every registered user.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;

    let users = UserRepository::new(&pool).list().await?;
    info!(total = users.len(), "registered users");

    for user in users {
        info!(
            id = %user.id,
            email = %user.email,
            name = %user.name,
            admin = user.is_admin,
            created = %user.created_at.format("%Y-%m-%d"),
        );
    }

    Ok(())
}
