//! Organization (farm) repository.

use sqlx::PgPool;
use tracing::instrument;

use green_aura_core::{OrganizationId, UserId};

use super::RepositoryError;
use crate::models::{Organization, OrganizationUpdate};

const ORGANIZATION_COLUMNS: &str = "id, owner_id, name, description, address, logo_url, \
                                    latitude, longitude, is_active, created_at";

pub struct OrganizationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrganizationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active farms, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_active(&self, limit: i64) -> Result<Vec<Organization>, RepositoryError> {
        let rows = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations \
             WHERE is_active \
             ORDER BY created_at DESC \
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrganizationId) -> Result<Option<Organization>, RepositoryError> {
        let row = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// The organization owned by a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Option<Organization>, RepositoryError> {
        let row = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Create an active organization for `owner_id`, or return the existing
    /// one. Each owner has at most one organization.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_or_create_for_owner(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> Result<Organization, RepositoryError> {
        let created = sqlx::query_as::<_, Organization>(&format!(
            "INSERT INTO organizations (owner_id, name, is_active) \
             VALUES ($1, $2, TRUE) \
             ON CONFLICT (owner_id) DO NOTHING \
             RETURNING {ORGANIZATION_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        if let Some(org) = created {
            tracing::info!(organization_id = %org.id, "Created organization for owner");
            return Ok(org);
        }

        self.get_by_owner(owner_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Apply owner edits.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the organization doesn't exist.
    pub async fn update(
        &self,
        id: OrganizationId,
        update: &OrganizationUpdate,
    ) -> Result<Organization, RepositoryError> {
        sqlx::query_as::<_, Organization>(&format!(
            "UPDATE organizations SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                address = COALESCE($4, address), \
                logo_url = COALESCE($5, logo_url), \
                latitude = COALESCE($6, latitude), \
                longitude = COALESCE($7, longitude), \
                is_active = COALESCE($8, is_active) \
             WHERE id = $1 \
             RETURNING {ORGANIZATION_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.address.as_deref())
        .bind(update.logo_url.as_deref())
        .bind(update.latitude)
        .bind(update.longitude)
        .bind(update.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
