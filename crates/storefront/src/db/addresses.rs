//! Delivery address repository. Every query is scoped to the owning user.

use sqlx::PgPool;

use green_aura_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

const ADDRESS_COLUMNS: &str =
    "id, user_id, address_line_1, city, pincode, landmark, address_type, created_at";

pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's addresses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_addresses \
             WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// `input` must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO user_addresses \
                (user_id, address_line_1, city, pincode, landmark, address_type) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&input.address_line_1)
        .bind(&input.city)
        .bind(&input.pincode)
        .bind(input.landmark.as_deref())
        .bind(input.address_type.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Replace an address. `input` must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>(&format!(
            "UPDATE user_addresses SET \
                address_line_1 = $3, city = $4, pincode = $5, landmark = $6, address_type = $7 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.address_line_1)
        .bind(&input.city)
        .bind(&input.pincode)
        .bind(input.landmark.as_deref())
        .bind(input.address_type.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no such address and
    /// `RepositoryError::Conflict` if orders were delivered to it.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM user_addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict("address is used by an order".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
