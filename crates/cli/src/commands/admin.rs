//! Administrator role commands.
//!
//! The user must already have registered through the storefront.

use thiserror::Error;

use devgon_core::{Email, EmailError, UserRole};
use devgon_storefront::backend::postgres::PostgresDocumentStore;
use devgon_storefront::services::users::{UserAdmin, UserAdminError};

/// Errors that can occur during role changes.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No profile with that email.
    #[error("No registered user with email: {0}")]
    UnknownUser(Email),

    #[error(transparent)]
    Store(#[from] UserAdminError),
}

/// Set the role of the user registered under `email`.
///
/// # Errors
///
/// Returns an error if the email is invalid, nobody registered with it, or
/// the store call fails.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(AdminError::from)?;

    let pool = super::connect().await?;
    let store = PostgresDocumentStore::new(pool);
    let users = UserAdmin::new(&store);

    let user = users
        .find_by_email(&email)
        .await
        .map_err(AdminError::from)?
        .ok_or_else(|| AdminError::UnknownUser(email.clone()))?;

    if user.profile.role == role {
        tracing::info!("{} already has role {}", email, role);
        return Ok(());
    }

    users
        .set_role(&user.id, role)
        .await
        .map_err(AdminError::from)?;
    tracing::info!("{} is now {}", email, role);
    Ok(())
}
