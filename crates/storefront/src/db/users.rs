//! User repository for database operations.
//!
//! Accounts, their password hashes and pending email verification codes.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use green_aura_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::{NewUser, ProfileUpdate, User};

/// An outstanding email verification code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub failed_attempts: i32,
}

const USER_COLUMNS: &str = "id, email, email_verified, full_name, phone_number, \
                            profile_picture_url, role, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Create a new user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, full_name, role, email_verified) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.email)
        .bind(new_user.full_name.as_deref())
        .bind(new_user.role)
        .bind(new_user.email_verified)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "email already exists"))?;

        sqlx::query("INSERT INTO user_passwords (user_id, password_hash) VALUES ($1, $2)")
            .bind(user.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let Some(user) = self.get_by_email(email).await? else {
            return Ok(None);
        };

        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM user_passwords WHERE user_id = $1")
                .bind(user.id)
                .fetch_optional(self.pool)
                .await?;

        Ok(hash.map(|(hash,)| (user, hash)))
    }

    /// Update profile fields. Absent fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                full_name = COALESCE($2, full_name), \
                phone_number = COALESCE($3, phone_number), \
                profile_picture_url = COALESCE($4, profile_picture_url) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(update.full_name.as_deref())
        .bind(update.phone_number.as_deref())
        .bind(update.profile_picture_url.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Mark a user's email as verified and drop any outstanding code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn mark_verified(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE users SET email_verified = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM email_verification_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Store a verification code, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn store_verification_code(
        &self,
        user_id: UserId,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO email_verification_codes (user_id, code, expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE \
             SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at, failed_attempts = 0",
        )
        .bind(user_id)
        .bind(code)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Get the outstanding verification code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_verification_code(
        &self,
        user_id: UserId,
    ) -> Result<Option<VerificationCode>, RepositoryError> {
        let row = sqlx::query_as::<_, VerificationCode>(
            "SELECT code, expires_at, failed_attempts \
             FROM email_verification_codes WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Count a wrong guess against the outstanding code and return the new
    /// total. Zero means there was no code to count against.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_failed_attempt(&self, user_id: UserId) -> Result<i32, RepositoryError> {
        let attempts: Option<(i32,)> = sqlx::query_as(
            "UPDATE email_verification_codes SET failed_attempts = failed_attempts + 1 \
             WHERE user_id = $1 RETURNING failed_attempts",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(attempts.map_or(0, |(n,)| n))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_verification_code(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM email_verification_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// Lock a user's row until the surrounding transaction ends, so work done
/// on their behalf runs one at a time.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user doesn't exist.
pub async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or(RepositoryError::NotFound)
}
