//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use green_aura_core::{Email, Role, UserId};

/// A storefront account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub email_verified: bool,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name to show in greetings and to seed a new organization.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.email.as_str())
    }
}

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub full_name: Option<String>,
    pub role: Role,
    /// Accounts created by operators skip the emailed code.
    pub email_verified: bool,
}

/// Profile edits. Absent fields are left as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(full_name: Option<&str>) -> User {
        User {
            id: UserId::random(),
            email: Email::parse("lakshmi@farm.in").unwrap(),
            email_verified: true,
            full_name: full_name.map(str::to_owned),
            phone_number: None,
            profile_picture_url: None,
            role: Role::Organization,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        assert_eq!(user(Some("Lakshmi Farms")).display_name(), "Lakshmi Farms");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user(None).display_name(), "lakshmi@farm.in");
        assert_eq!(user(Some("   ")).display_name(), "lakshmi@farm.in");
    }
}
