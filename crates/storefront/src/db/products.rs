//! Product repository.
//!
//! Public listings only ever show available products from active farms.
//! Owner queries are always scoped to the owner's organization.

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use green_aura_core::{OrganizationId, ProductId};

use super::RepositoryError;
use crate::models::{CategorySummary, NewProduct, Product, ProductSort, ProductUpdate};

const PRODUCT_COLUMNS: &str = "p.id, p.organization_id, p.name, p.description, p.category, \
                               p.price, p.unit, p.stock_quantity, p.image_url, p.is_available, \
                               p.created_at";

/// Filters for a public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    /// Case-insensitive exact match on the category.
    pub category: Option<String>,
    pub organization_id: Option<OrganizationId>,
    pub sort: ProductSort,
    pub limit: i64,
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Available products from active farms matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_available(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             JOIN organizations o ON o.id = p.organization_id \
             WHERE p.is_available AND o.is_active"
        ));

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND p.name ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(search)));
        }
        if let Some(category) = query.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND lower(p.category) = lower(");
            qb.push_bind(category.to_owned());
            qb.push(")");
        }
        if let Some(org) = query.organization_id {
            qb.push(" AND p.organization_id = ");
            qb.push_bind(org);
        }

        qb.push(" ORDER BY ");
        qb.push(query.sort.order_by());
        qb.push(" LIMIT ");
        qb.push_bind(query.limit);

        let rows = qb.build_query_as::<Product>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// The featured shelf: the newest available products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        self.list_available(&ProductQuery {
            limit,
            ..ProductQuery::default()
        })
        .await
    }

    /// Every product of an organization, including unavailable ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.organization_id = $1 \
             ORDER BY p.created_at DESC"
        ))
        .bind(organization_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Categories with at least one available product, busiest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategorySummary>(
            "SELECT min(p.category) AS category, COUNT(*) AS product_count \
             FROM products p \
             JOIN organizations o ON o.id = p.organization_id \
             WHERE p.is_available AND o.is_active \
               AND p.category IS NOT NULL AND trim(p.category) <> '' \
             GROUP BY lower(p.category) \
             ORDER BY product_count DESC, category ASC",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// A product as seen by shoppers: hidden if unavailable or its farm is
    /// inactive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_public(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             JOIN organizations o ON o.id = p.organization_id \
             WHERE p.id = $1 AND p.is_available AND o.is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// A product only if it belongs to `organization_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_organization(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.id = $1 AND p.organization_id = $2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(
        &self,
        organization_id: OrganizationId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products AS p \
                (organization_id, name, description, category, price, unit, \
                 stock_quantity, image_url, is_available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(organization_id)
        .bind(product.name.trim())
        .bind(product.description.as_deref())
        .bind(product.category.as_deref().map(str::trim))
        .bind(product.price)
        .bind(product.unit.trim())
        .bind(product.stock_quantity)
        .bind(product.image_url.as_deref())
        .bind(product.is_available)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Apply owner edits to a product of `organization_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product belongs to the
    /// organization.
    pub async fn update(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products AS p SET \
                name = COALESCE($3, p.name), \
                description = COALESCE($4, p.description), \
                category = COALESCE($5, p.category), \
                price = COALESCE($6, p.price), \
                unit = COALESCE($7, p.unit), \
                stock_quantity = COALESCE($8, p.stock_quantity), \
                image_url = COALESCE($9, p.image_url), \
                is_available = COALESCE($10, p.is_available) \
             WHERE p.id = $1 AND p.organization_id = $2 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(update.category.as_deref().map(str::trim))
        .bind(update.price)
        .bind(update.unit.as_deref().map(str::trim))
        .bind(update.stock_quantity)
        .bind(update.image_url.as_deref())
        .bind(update.is_available)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product of `organization_id`.
    ///
    /// Products that appear on past orders cannot be deleted; mark them
    /// unavailable instead.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product belongs to the
    /// organization, `RepositoryError::Conflict` if orders reference it.
    pub async fn delete(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product appears on existing orders; mark it unavailable instead"
                            .to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of products an organization lists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE organization_id = $1")
                .bind(organization_id)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
