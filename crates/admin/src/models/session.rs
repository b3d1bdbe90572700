//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use larkspur_core::{Email, UserId};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
/// Only users whose identity-provider role is `admin` ever get one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's database ID.
    pub id: UserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the login state parameter (CSRF protection).
    pub const LOGIN_STATE: &str = "login_state";
}
