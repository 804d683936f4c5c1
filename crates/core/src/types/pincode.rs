//! Indian postal index numbers for delivery addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PincodeError {
    #[error("pincode must be exactly 6 digits")]
    BadLength,
    #[error("pincode must contain only digits")]
    NotNumeric,
    #[error("pincode cannot start with 0")]
    LeadingZero,
}

/// A six-digit PIN code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    /// Parse a PIN code, ignoring surrounding whitespace and a single inner
    /// space (`560 001`).
    ///
    /// # Errors
    ///
    /// Returns a [`PincodeError`] when the input is not six digits or starts
    /// with zero.
    pub fn parse(s: &str) -> Result<Self, PincodeError> {
        let compact: String = s.trim().split(' ').collect();
        if !compact.chars().all(|c| c.is_ascii_digit()) {
            return Err(PincodeError::NotNumeric);
        }
        if compact.len() != 6 {
            return Err(PincodeError::BadLength);
        }
        if compact.starts_with('0') {
            return Err(PincodeError::LeadingZero);
        }
        Ok(Self(compact))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Pincode {
    type Error = PincodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pincode> for String {
    fn from(pin: Pincode) -> Self {
        pin.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid() {
        assert_eq!(Pincode::parse("560001").unwrap().as_str(), "560001");
        assert_eq!(Pincode::parse(" 560 001 ").unwrap().as_str(), "560001");
    }

    #[test]
    fn test_invalid() {
        assert_eq!(Pincode::parse("56001"), Err(PincodeError::BadLength));
        assert_eq!(Pincode::parse("5600011"), Err(PincodeError::BadLength));
        assert_eq!(Pincode::parse("56A001"), Err(PincodeError::NotNumeric));
        assert_eq!(Pincode::parse("060001"), Err(PincodeError::LeadingZero));
    }
}
