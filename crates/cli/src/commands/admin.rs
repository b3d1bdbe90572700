//! Local role management command.
//!
//! This only touches the local mirror; the identity provider's metadata is
//! managed from the admin panel. Useful for bootstrapping the first admin
//! before the panel is reachable.

use larkspur_core::UserRole;

use super::{CommandError, connect};

/// Set a user's role by email.
///
/// # Errors
///
/// Returns an error if the user does not exist or the update fails.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), CommandError> {
    let pool = connect().await?;

    let result = sqlx::query("UPDATE shop.user SET role = $2, updated_at = now() WHERE email = $1")
        .bind(email)
        .bind(role)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CommandError::Invalid(format!(
            "no user with email {email}; they must sign in once first"
        )));
    }

    tracing::info!(email, role = %role, "role updated");
    Ok(())
}
