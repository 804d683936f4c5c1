//! Order repository and transactional order placement.
//!
//! [`create_order_transaction`] is the only way orders come into existence.
//! It runs on a caller-supplied connection so checkout can place several
//! orders inside one outer transaction.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tracing::instrument;

use green_aura_core::{
    AddressId, OrderId, OrderStatus, OrganizationId, PaymentStatus, ProductId, UserId,
};

use super::{RepositoryError, cart, payments};
use crate::models::{
    Address, Order, OrderCustomer, OrderDetail, OrderItem, OrderSummary, Organization,
    PAYMENT_METHOD_COD,
};

const ORDER_COLUMNS: &str = "id, user_id, organization_id, delivery_address_id, status, \
                             delivery_charge, total_amount, order_date, expected_delivery_time";

const SUMMARY_SELECT: &str = "SELECT o.id, o.user_id, o.organization_id, \
        org.name AS organization_name, o.status, o.total_amount, o.order_date, \
        (SELECT COALESCE(SUM(i.quantity), 0)::BIGINT FROM order_items i WHERE i.order_id = o.id) \
            AS item_count \
     FROM orders o \
     JOIN organizations org ON org.id = o.organization_id";

/// Errors from placing an order. Any of these rolls the transaction back.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("order has no items")]
    EmptyOrder,

    #[error("item quantities must be at least 1")]
    InvalidQuantity,

    #[error("delivery address not found")]
    AddressNotFound,

    #[error("farm is not accepting orders")]
    OrganizationUnavailable,

    #[error("product {0} is not available")]
    ProductUnavailable(ProductId),

    #[error("product {0} is sold by a different farm")]
    WrongOrganization(ProductId),

    #[error("only {available} left of product {product_id}, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: i32,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One requested line of an order.
#[derive(Debug, Clone, Copy)]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Input to [`create_order_transaction`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub delivery_address_id: AddressId,
    pub delivery_charge: Decimal,
    pub items: Vec<OrderLineInput>,
}

/// Reject empty orders and zero quantities, summing duplicate products while
/// keeping first-seen order.
///
/// # Errors
///
/// Returns `EmptyOrder` or `InvalidQuantity`.
pub fn consolidate_lines(items: &[OrderLineInput]) -> Result<Vec<OrderLineInput>, PlaceOrderError> {
    if items.is_empty() {
        return Err(PlaceOrderError::EmptyOrder);
    }
    let mut lines: Vec<OrderLineInput> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(PlaceOrderError::InvalidQuantity);
        }
        match lines.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(PlaceOrderError::InvalidQuantity)?;
            }
            None => lines.push(*item),
        }
    }
    Ok(lines)
}

/// Σ unit price × quantity, plus delivery.
#[must_use]
pub fn order_total(lines: &[(Decimal, u32)], delivery_charge: Decimal) -> Decimal {
    lines
        .iter()
        .map(|(price, quantity)| *price * Decimal::from(*quantity))
        .sum::<Decimal>()
        + delivery_charge
}

#[derive(Debug, sqlx::FromRow)]
struct LockedProduct {
    id: ProductId,
    organization_id: OrganizationId,
    price: Decimal,
    stock_quantity: i32,
    is_available: bool,
}

fn check_line(
    org: OrganizationId,
    line: OrderLineInput,
    product: Option<&LockedProduct>,
) -> Result<Decimal, PlaceOrderError> {
    let product = product.ok_or(PlaceOrderError::ProductUnavailable(line.product_id))?;
    if product.organization_id != org {
        return Err(PlaceOrderError::WrongOrganization(line.product_id));
    }
    if !product.is_available {
        return Err(PlaceOrderError::ProductUnavailable(line.product_id));
    }
    if i64::from(product.stock_quantity) < i64::from(line.quantity) {
        return Err(PlaceOrderError::InsufficientStock {
            product_id: line.product_id,
            requested: line.quantity,
            available: product.stock_quantity,
        });
    }
    Ok(product.price)
}

/// Place one order for one farm on an open transaction.
///
/// Locks each product row, snapshots prices onto the order items,
/// decrements stock, records a pending cash-on-delivery payment and drops
/// the ordered products from the user's saved cart. The caller commits.
///
/// # Errors
///
/// Returns a [`PlaceOrderError`] describing the first check that failed.
#[instrument(skip(conn, order), fields(user_id = %order.user_id, organization_id = %order.organization_id))]
pub async fn create_order_transaction(
    conn: &mut PgConnection,
    order: &NewOrder,
) -> Result<OrderId, PlaceOrderError> {
    let lines = consolidate_lines(&order.items)?;

    let (address_ok,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM user_addresses WHERE id = $1 AND user_id = $2)",
    )
    .bind(order.delivery_address_id)
    .bind(order.user_id)
    .fetch_one(&mut *conn)
    .await?;
    if !address_ok {
        return Err(PlaceOrderError::AddressNotFound);
    }

    let active: Option<(bool,)> = sqlx::query_as("SELECT is_active FROM organizations WHERE id = $1")
        .bind(order.organization_id)
        .fetch_optional(&mut *conn)
        .await?;
    if !matches!(active, Some((true,))) {
        return Err(PlaceOrderError::OrganizationUnavailable);
    }

    // Lock in id order so concurrent checkouts can't deadlock.
    let product_ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
    let locked = sqlx::query_as::<_, LockedProduct>(
        "SELECT id, organization_id, price, stock_quantity, is_available \
         FROM products WHERE id = ANY($1) \
         ORDER BY id \
         FOR UPDATE",
    )
    .bind(&product_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut priced = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = locked.iter().find(|p| p.id == line.product_id);
        let price = check_line(order.organization_id, *line, product)?;
        priced.push((price, line.quantity));
    }
    let total = order_total(&priced, order.delivery_charge);

    let (order_id,): (OrderId,) = sqlx::query_as(
        "INSERT INTO orders \
            (user_id, organization_id, delivery_address_id, status, delivery_charge, total_amount) \
         VALUES ($1, $2, $3, 'pending', $4, $5) \
         RETURNING id",
    )
    .bind(order.user_id)
    .bind(order.organization_id)
    .bind(order.delivery_address_id)
    .bind(order.delivery_charge)
    .bind(total)
    .fetch_one(&mut *conn)
    .await?;

    for (line, (price, _)) in lines.iter().zip(&priced) {
        let quantity = i32::try_from(line.quantity).map_err(|_| PlaceOrderError::InvalidQuantity)?;
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price_at_order) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(quantity)
        .bind(*price)
        .execute(&mut *conn)
        .await?;

        sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $2 WHERE id = $1")
            .bind(line.product_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;
    }

    payments::create_pending(&mut *conn, order_id, total, PAYMENT_METHOD_COD).await?;
    cart::remove_products(&mut *conn, order.user_id, &product_ids).await?;

    tracing::info!(order_id = %order_id, total = %total, items = lines.len(), "Order placed");
    Ok(order_id)
}

/// Orders per status for the owner dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummary>(&format!(
            "{SUMMARY_SELECT} WHERE o.user_id = $1 ORDER BY o.order_date DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// A farm's orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
        status: Option<OrderStatus>,
        limit: Option<i64>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(SUMMARY_SELECT);
        qb.push(" WHERE o.organization_id = ");
        qb.push_bind(organization_id);
        if let Some(status) = status {
            qb.push(" AND o.status = ");
            qb.push_bind(status);
        }
        qb.push(" ORDER BY o.order_date DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }

        let rows = qb.build_query_as::<OrderSummary>().fetch_all(self.pool).await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn status_counts(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<StatusCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM orders \
             WHERE organization_id = $1 \
             GROUP BY status \
             ORDER BY status",
        )
        .bind(organization_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// An order only if `user_id` placed it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// An order only if it was placed with `organization_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_organization(
        &self,
        organization_id: OrganizationId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItem>(
            "SELECT i.id, i.order_id, i.product_id, p.name AS product_name, p.unit, p.image_url, \
                    i.quantity, i.price_at_order \
             FROM order_items i \
             JOIN products p ON p.id = i.product_id \
             WHERE i.order_id = $1 \
             ORDER BY p.name",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Load the items, address, farm and payment of an order. Customer
    /// contact details are included only for the fulfilling farm.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a referenced row is
    /// missing.
    pub async fn detail(
        &self,
        order: Order,
        include_customer: bool,
    ) -> Result<OrderDetail, RepositoryError> {
        let items = self.items(order.id).await?;

        let address = sqlx::query_as::<_, Address>(
            "SELECT id, user_id, address_line_1, city, pincode, landmark, address_type, created_at \
             FROM user_addresses WHERE id = $1",
        )
        .bind(order.delivery_address_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("order {} has no delivery address", order.id))
        })?;

        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, owner_id, name, description, address, logo_url, latitude, longitude, \
                    is_active, created_at \
             FROM organizations WHERE id = $1",
        )
        .bind(order.organization_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("order {} has no organization", order.id))
        })?;

        let payment = payments::PaymentRepository::new(self.pool)
            .get_for_order(order.id)
            .await?;

        let customer = if include_customer {
            sqlx::query_as::<_, OrderCustomer>(
                "SELECT full_name, email, phone_number FROM users WHERE id = $1",
            )
            .bind(order.user_id)
            .fetch_optional(self.pool)
            .await?
        } else {
            None
        };

        let next_status = order.status.next();
        Ok(OrderDetail {
            order,
            items,
            address,
            organization,
            payment,
            customer,
            next_status,
        })
    }

    /// Move an order from `from` to `to` if it is still in `from`.
    ///
    /// Returns `None` when the order doesn't belong to the farm or its
    /// status changed underneath us. Reaching `delivered` completes the
    /// cash-on-delivery payment in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        organization_id: OrganizationId,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $4 \
             WHERE id = $1 AND organization_id = $2 AND status = $3 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = updated else {
            return Ok(None);
        };

        if to == OrderStatus::Delivered {
            payments::set_status(&mut tx, id, PaymentStatus::Completed, None).await?;
        }

        tx.commit().await?;
        tracing::info!(order_id = %id, from = %from, to = %to, "Order status advanced");
        Ok(Some(order))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product_id: ProductId, quantity: u32) -> OrderLineInput {
        OrderLineInput {
            product_id,
            quantity,
        }
    }

    #[test]
    fn test_consolidate_sums_duplicates() {
        let a = ProductId::random();
        let b = ProductId::random();
        let lines = consolidate_lines(&[line(a, 2), line(b, 1), line(a, 3)]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, a);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[1].quantity, 1);
    }

    #[test]
    fn test_consolidate_rejects_empty_and_zero() {
        assert!(matches!(consolidate_lines(&[]), Err(PlaceOrderError::EmptyOrder)));
        assert!(matches!(
            consolidate_lines(&[line(ProductId::random(), 0)]),
            Err(PlaceOrderError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_order_total_includes_delivery() {
        let total = order_total(
            &[(Decimal::new(4050, 2), 2), (Decimal::new(120, 0), 1)],
            Decimal::new(30, 0),
        );
        assert_eq!(total, Decimal::new(23100, 2));
    }

    fn locked(org: OrganizationId, stock: i32, available: bool) -> LockedProduct {
        LockedProduct {
            id: ProductId::random(),
            organization_id: org,
            price: Decimal::new(50, 0),
            stock_quantity: stock,
            is_available: available,
        }
    }

    #[test]
    fn test_check_line() {
        let org = OrganizationId::random();
        let product = locked(org, 3, true);
        let ok = line(product.id, 3);
        assert_eq!(check_line(org, ok, Some(&product)).unwrap(), Decimal::new(50, 0));

        assert!(matches!(
            check_line(org, line(product.id, 4), Some(&product)),
            Err(PlaceOrderError::InsufficientStock { requested: 4, available: 3, .. })
        ));
        assert!(matches!(
            check_line(OrganizationId::random(), ok, Some(&product)),
            Err(PlaceOrderError::WrongOrganization(_))
        ));
        assert!(matches!(
            check_line(org, ok, None),
            Err(PlaceOrderError::ProductUnavailable(_))
        ));

        let hidden = locked(org, 10, false);
        assert!(matches!(
            check_line(org, line(hidden.id, 1), Some(&hidden)),
            Err(PlaceOrderError::ProductUnavailable(_))
        ));
    }
}
