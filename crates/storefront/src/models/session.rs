//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use devgon_core::{Email, UserId, UserRole};

/// Session-stored user identity.
///
/// Written at login and read by the auth extractors on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Identity provider id (also the `users` record id).
    pub id: UserId,
    pub email: Email,
    /// Display name from the profile.
    pub name: String,
    pub role: UserRole,
}

impl SessionUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the session's cart.
    pub const CART: &str = "cart";
}
