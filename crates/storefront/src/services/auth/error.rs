//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] green_aura_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but the emailed code hasn't been entered yet.
    #[error("email address not verified")]
    EmailNotVerified,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Verification code doesn't match.
    #[error("invalid verification code")]
    InvalidCode,

    /// Verification code is past its expiry.
    #[error("verification code expired")]
    CodeExpired,

    /// Too many wrong codes; the code has been revoked.
    #[error("too many verification attempts")]
    TooManyAttempts,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
