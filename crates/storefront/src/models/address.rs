//! Delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use green_aura_core::{AddressId, Pincode, UserId};

use super::catalog::ValidationError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub address_line_1: String,
    pub city: String,
    pub pincode: String,
    pub landmark: Option<String>,
    pub address_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Address fields as submitted by the customer.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub address_line_1: String,
    pub city: String,
    pub pincode: String,
    pub landmark: Option<String>,
    /// Free-form label such as "home" or "work".
    pub address_type: Option<String>,
}

impl AddressInput {
    /// Validate and normalize the input.
    ///
    /// # Errors
    ///
    /// Rejects blank lines and malformed PIN codes.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let address_line_1 = self.address_line_1.trim().to_owned();
        if address_line_1.is_empty() {
            return Err(ValidationError::new("address_line_1", "is required"));
        }
        let city = self.city.trim().to_owned();
        if city.is_empty() {
            return Err(ValidationError::new("city", "is required"));
        }
        let pincode = Pincode::parse(&self.pincode)
            .map_err(|_| ValidationError::new("pincode", "must be 6 digits not starting with 0"))?;

        Ok(Self {
            address_line_1,
            city,
            pincode: pincode.as_str().to_owned(),
            landmark: non_blank(self.landmark),
            address_type: non_blank(self.address_type).map(|t| t.to_lowercase()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            address_line_1: " 12 MG Road ".to_owned(),
            city: "Bengaluru".to_owned(),
            pincode: "560 001".to_owned(),
            landmark: Some("  ".to_owned()),
            address_type: Some("Home".to_owned()),
        }
    }

    #[test]
    fn test_normalized_trims_and_compacts() {
        let a = input().normalized().unwrap();
        assert_eq!(a.address_line_1, "12 MG Road");
        assert_eq!(a.pincode, "560001");
        assert_eq!(a.landmark, None);
        assert_eq!(a.address_type.as_deref(), Some("home"));
    }

    #[test]
    fn test_normalized_rejects_bad_pincode() {
        let mut a = input();
        a.pincode = "012345".to_owned();
        assert_eq!(a.normalized().unwrap_err().field, "pincode");
    }

    #[test]
    fn test_normalized_requires_city() {
        let mut a = input();
        a.city = String::new();
        assert_eq!(a.normalized().unwrap_err().field, "city");
    }
}
