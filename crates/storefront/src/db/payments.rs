//! Payment records. One per order.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use green_aura_core::{OrderId, PaymentStatus};

use super::RepositoryError;
use crate::models::Payment;

const PAYMENT_COLUMNS: &str =
    "id, order_id, amount, payment_method, status, transaction_id, gateway_response, created_at";

/// Insert a pending payment for an order inside an open transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order already has a payment.
pub async fn create_pending(
    conn: &mut PgConnection,
    order_id: OrderId,
    amount: Decimal,
    payment_method: &str,
) -> Result<Payment, RepositoryError> {
    sqlx::query_as::<_, Payment>(&format!(
        "INSERT INTO payments (order_id, amount, payment_method, status) \
         VALUES ($1, $2, $3, 'pending') \
         RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(order_id)
    .bind(amount)
    .bind(payment_method)
    .fetch_one(conn)
    .await
    .map_err(|e| RepositoryError::conflict_on_unique(e, "order already has a payment"))
}

/// Set the payment status of an order inside an open transaction.
///
/// Returns whether a payment row was updated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_status(
    conn: &mut PgConnection,
    order_id: OrderId,
    status: PaymentStatus,
    transaction_id: Option<&str>,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE payments SET status = $2, transaction_id = COALESCE($3, transaction_id) \
         WHERE order_id = $1",
    )
    .bind(order_id)
    .bind(status)
    .bind(transaction_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_order(&self, order_id: OrderId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}
