//! Account email addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Reasons an address is rejected at signup or sign-in.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain exactly one @ symbol")]
    BadAtSymbol,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain must contain a dot")]
    BadDomain,
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A normalized email address.
///
/// Surrounding whitespace is trimmed and the whole address is lowercased, so
/// `Asha@Farm.IN` and `asha@farm.in` name the same account.
///
/// ```
/// use green_aura_core::Email;
///
/// let email = Email::parse("  Asha@Farm.IN ").unwrap();
/// assert_eq!(email.as_str(), "asha@farm.in");
/// assert!(Email::parse("asha@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Validate and normalize an address.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first problem found.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::BadAtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::BadAtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(EmailError::BadDomain);
        }

        Ok(Self(s.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the @, used as a fallback display name.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or("", |(local, _)| local)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // Stored rows were normalized on the way in.
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let email = Email::parse(" Ravi.K@GreenFarm.co.in\n").unwrap();
        assert_eq!(email.as_str(), "ravi.k@greenfarm.co.in");
        assert_eq!(email.local_part(), "ravi.k");
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("ravi"), Err(EmailError::BadAtSymbol));
        assert_eq!(Email::parse("a@b@c.in"), Err(EmailError::BadAtSymbol));
        assert_eq!(Email::parse("@farm.in"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("ravi@farm"), Err(EmailError::BadDomain));
        assert_eq!(Email::parse("ravi@farm..in"), Err(EmailError::BadDomain));
        assert_eq!(Email::parse("ra vi@farm.in"), Err(EmailError::Whitespace));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@farm.in", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Email = serde_json::from_str("\"Meera@Farm.in\"").unwrap();
        assert_eq!(ok.as_str(), "meera@farm.in");
        assert!(serde_json::from_str::<Email>("\"meera\"").is_err());
    }
}
