//! Authentication service.
//!
//! Password sign-up with an emailed six-digit code, and password login.
//! There is no mail transport yet, so codes are written to the log. A code
//! is single-use and is revoked after too many wrong guesses.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::PgPool;
use tracing::instrument;

use green_aura_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::organizations::OrganizationRepository;
use crate::db::users::{UserRepository, VerificationCode};
use crate::models::{NewUser, Organization, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// How long an emailed code stays valid.
const CODE_TTL_MINUTES: i64 = 15;

/// Wrong guesses allowed before a code is revoked.
pub const MAX_CODE_ATTEMPTS: i32 = 5;

/// Sign-up details.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Role,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    organizations: OrganizationRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            organizations: OrganizationRepository::new(pool),
        }
    }

    /// Register a new, unverified account and issue its verification code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, registration), fields(email = %registration.email, role = %registration.role))]
    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        let email = Email::parse(&registration.email)?;
        validate_password(&registration.password)?;
        let password_hash = hash_password(&registration.password)?;

        let new_user = NewUser {
            email,
            full_name: registration
                .full_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned),
            role: registration.role,
            email_verified: false,
        };

        let user = self
            .users
            .create_with_password(&new_user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        self.issue_code(&user).await?;
        Ok(user)
    }

    /// Check a verification code and mark the account verified.
    ///
    /// Accounts that are already verified have no code to match, so they
    /// are rejected like a wrong code. After [`MAX_CODE_ATTEMPTS`] misses the
    /// code is revoked and a new one must be requested.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` if no code matches,
    /// `AuthError::CodeExpired` if it is too old and
    /// `AuthError::TooManyAttempts` once the code has been revoked.
    #[instrument(skip(self, code))]
    pub async fn verify(&self, email: &str, code: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        let stored = if user.email_verified {
            None
        } else {
            self.users.get_verification_code(user.id).await?
        };

        match check_code(user.email_verified, stored.as_ref(), code, Utc::now()) {
            Ok(()) => {}
            Err(AuthError::InvalidCode) if stored.is_some() => {
                let attempts = self.users.record_failed_attempt(user.id).await?;
                if attempts >= MAX_CODE_ATTEMPTS {
                    self.users.delete_verification_code(user.id).await?;
                    tracing::warn!(user_id = %user.id, attempts, "Verification code revoked");
                    return Err(AuthError::TooManyAttempts);
                }
                return Err(AuthError::InvalidCode);
            }
            Err(err) => return Err(err),
        }

        self.users.mark_verified(user.id).await?;
        tracing::info!(user_id = %user.id, "Email verified");

        self.ensure_organization(user.id).await?;
        self.get_user(user.id).await
    }

    /// Issue a fresh code for an unverified account.
    ///
    /// Unknown and already-verified addresses succeed silently so the
    /// endpoint can't be used to discover which accounts exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    #[instrument(skip(self))]
    pub async fn resend_code(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        match self.users.get_by_email(&email).await? {
            Some(user) if !user.email_verified => self.issue_code(&user).await,
            _ => Ok(()),
        }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::EmailNotVerified` if the code was never entered.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        self.ensure_organization(user.id).await?;
        Ok(user)
    }

    /// Make sure an organization account owns a farm, creating one named
    /// after the user on first use. Returns `None` for customers.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn ensure_organization(
        &self,
        user_id: UserId,
    ) -> Result<Option<Organization>, AuthError> {
        let user = self.get_user(user_id).await?;
        if user.role != Role::Organization {
            return Ok(None);
        }
        let org = self
            .organizations
            .get_or_create_for_owner(user.id, &organization_name_for(&user))
            .await?;
        Ok(Some(org))
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn issue_code(&self, user: &User) -> Result<(), AuthError> {
        let code = generate_code();
        let expires_at = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);
        self.users
            .store_verification_code(user.id, &code, expires_at)
            .await?;
        tracing::info!(
            user_id = %user.id,
            email = %user.email,
            code = %code,
            expires_at = %expires_at,
            "Verification code issued"
        );
        Ok(())
    }
}

/// Decide whether `submitted` unlocks an account.
///
/// A verified account never matches: the code is single-use.
fn check_code(
    email_verified: bool,
    stored: Option<&VerificationCode>,
    submitted: &str,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    if email_verified {
        return Err(AuthError::InvalidCode);
    }
    let stored = stored.ok_or(AuthError::InvalidCode)?;
    if stored.failed_attempts >= MAX_CODE_ATTEMPTS {
        return Err(AuthError::TooManyAttempts);
    }
    if stored.code != submitted.trim() {
        return Err(AuthError::InvalidCode);
    }
    if stored.expires_at < now {
        return Err(AuthError::CodeExpired);
    }
    Ok(())
}

/// Name for a farm created on an owner's first sign-in.
fn organization_name_for(user: &User) -> String {
    let name = user.display_name().trim();
    if name.is_empty() {
        "My Organization".to_owned()
    } else {
        name.to_owned()
    }
}

/// A six-digit code, zero-padded.
fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` for passwords that are too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    fn stored(code: &str, failed_attempts: i32) -> VerificationCode {
        VerificationCode {
            code: code.to_owned(),
            expires_at: Utc::now() + Duration::minutes(CODE_TTL_MINUTES),
            failed_attempts,
        }
    }

    #[test]
    fn test_check_code_accepts_matching_code() {
        let code = stored("482913", 0);
        assert!(check_code(false, Some(&code), " 482913 ", Utc::now()).is_ok());
    }

    #[test]
    fn test_check_code_rejects_wrong_or_missing_code() {
        let code = stored("482913", 0);
        assert!(matches!(
            check_code(false, Some(&code), "000000", Utc::now()),
            Err(AuthError::InvalidCode)
        ));
        assert!(matches!(
            check_code(false, None, "482913", Utc::now()),
            Err(AuthError::InvalidCode)
        ));
    }

    #[test]
    fn test_check_code_never_matches_verified_account() {
        let code = stored("482913", 0);
        for submitted in ["482913", "000000-wrong", ""] {
            assert!(matches!(
                check_code(true, Some(&code), submitted, Utc::now()),
                Err(AuthError::InvalidCode)
            ));
            assert!(matches!(
                check_code(true, None, submitted, Utc::now()),
                Err(AuthError::InvalidCode)
            ));
        }
    }

    #[test]
    fn test_check_code_expired() {
        let code = stored("482913", 0);
        let later = Utc::now() + Duration::minutes(CODE_TTL_MINUTES + 1);
        assert!(matches!(
            check_code(false, Some(&code), "482913", later),
            Err(AuthError::CodeExpired)
        ));
    }

    #[test]
    fn test_check_code_locked_after_max_attempts() {
        let code = stored("482913", MAX_CODE_ATTEMPTS);
        assert!(matches!(
            check_code(false, Some(&code), "482913", Utc::now()),
            Err(AuthError::TooManyAttempts)
        ));
        let code = stored("482913", MAX_CODE_ATTEMPTS - 1);
        assert!(check_code(false, Some(&code), "482913", Utc::now()).is_ok());
    }

    #[test]
    fn test_generate_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
