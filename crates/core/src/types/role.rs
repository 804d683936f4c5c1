//! Account roles.

use serde::{Deserialize, Serialize};

/// The string does not name a role.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// What kind of account a user holds.
///
/// Customers shop and place orders. Organization accounts own exactly one
/// farm, manage its catalog, and fulfil its orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Organization,
}

impl Role {
    /// Where a signed-in user of this role lands by default.
    #[must_use]
    pub const fn landing_path(self) -> &'static str {
        match self {
            Self::Customer => "/",
            Self::Organization => "/owner",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Organization => "organization",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "organization" => Ok(Self::Organization),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_paths() {
        assert_eq!(Role::Customer.landing_path(), "/");
        assert_eq!(Role::Organization.landing_path(), "/owner");
    }

    #[test]
    fn test_parse() {
        assert_eq!("organization".parse::<Role>().unwrap(), Role::Organization);
        assert_eq!(
            "admin".parse::<Role>(),
            Err(RoleParseError("admin".to_owned()))
        );
    }
}
