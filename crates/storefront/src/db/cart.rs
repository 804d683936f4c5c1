//! Persisted cart rows for signed-in users.
//!
//! The session cart is the working copy; these rows let it follow the user
//! across devices and survive session expiry.

use sqlx::{PgConnection, PgPool};

use green_aura_core::{CartLine, OrganizationId, ProductId, UserId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    product_id: ProductId,
    organization_id: OrganizationId,
    name: String,
    unit: String,
    price: rust_decimal::Decimal,
    image_url: Option<String>,
    quantity: i32,
}

impl TryFrom<CartRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative cart quantity for product {}",
                row.product_id
            ))
        })?;
        Ok(Self {
            product_id: row.product_id,
            organization_id: row.organization_id,
            name: row.name,
            unit: row.unit,
            unit_price: row.price,
            image_url: row.image_url,
            quantity,
        })
    }
}

const LIST_SQL: &str = "SELECT c.product_id, p.organization_id, p.name, p.unit, p.price, \
                               p.image_url, c.quantity \
                        FROM cart_items c \
                        JOIN products p ON p.id = c.product_id \
                        WHERE c.user_id = $1 \
                        ORDER BY c.added_at DESC";

fn quantity_param(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {quantity} is too large")))
}

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved lines with current product details, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(LIST_SQL)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// Set the saved quantity for a product, inserting the row if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity_param(quantity)?)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Replace what was saved with `lines`, skipping products that are gone,
    /// hidden or sold by an inactive farm. Returns the products written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    pub async fn replace_all(
        &self,
        user_id: UserId,
        lines: &[CartLine],
    ) -> Result<Vec<ProductId>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let mut saved = Vec::with_capacity(lines.len());
        for line in lines {
            let written: Option<(ProductId,)> = sqlx::query_as(
                "INSERT INTO cart_items (user_id, product_id, quantity) \
                 SELECT $1, p.id, $3 FROM products p \
                 JOIN organizations o ON o.id = p.organization_id \
                 WHERE p.id = $2 AND p.is_available AND o.is_active \
                 RETURNING product_id",
            )
            .bind(user_id)
            .bind(line.product_id)
            .bind(quantity_param(line.quantity)?)
            .fetch_optional(&mut *tx)
            .await?;
            saved.extend(written.map(|(id,)| id));
        }
        tx.commit().await?;
        Ok(saved)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// A user's saved cart read inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_in(conn: &mut PgConnection, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartRow>(LIST_SQL)
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(CartLine::try_from).collect()
}

/// Remove the given products from a user's saved cart inside an open
/// transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn remove_products(
    conn: &mut PgConnection,
    user_id: UserId,
    product_ids: &[ProductId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = ANY($2)")
        .bind(user_id)
        .bind(product_ids)
        .execute(conn)
        .await?;
    Ok(())
}
