//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use green_aura_core::{Email, Role, UserId};

use super::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user and to
/// make role decisions without a database round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Account role.
    pub role: Role,
    /// Display name, if the user gave one.
    pub full_name: Option<String>,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            full_name: user.full_name.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the session cart.
    pub const CART: &str = "cart";
}
