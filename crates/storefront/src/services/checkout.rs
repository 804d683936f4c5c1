//! Checkout: turns the session cart into orders.
//!
//! A cart may hold products from several farms. Each farm gets its own
//! order, and all of them are placed in one transaction so a failure on any
//! farm leaves nothing behind.
//!
//! Orders are built from the saved cart, read while the customer's row is
//! locked. Placing removes the ordered lines, so a second checkout racing
//! the first finds an empty cart.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use green_aura_core::{AddressId, Cart, CartLine, OrderId, Price, UserId};

use super::cart::{load_session_cart, save_session_cart};
use crate::db::RepositoryError;
use crate::db::addresses::AddressRepository;
use crate::db::cart;
use crate::db::orders::{NewOrder, OrderLineInput, PlaceOrderError, create_order_transaction};
use crate::db::users::lock_user;
use crate::models::Address;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Order(#[from] PlaceOrderError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Order(PlaceOrderError::Database(err))
    }
}

/// What the checkout page shows before placing.
#[derive(Debug, Serialize)]
pub struct CheckoutSummary {
    pub addresses: Vec<Address>,
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    /// One order, and one delivery charge, per farm.
    pub order_count: usize,
    pub subtotal: Decimal,
    pub delivery_total: Decimal,
    pub total: Decimal,
    pub total_display: String,
}

impl CheckoutSummary {
    fn new(addresses: Vec<Address>, cart: &Cart, delivery_charge: Decimal) -> Self {
        let order_count = cart.organizations().len();
        let subtotal = cart.subtotal();
        let delivery_total = delivery_charge * Decimal::from(order_count);
        let total = subtotal + delivery_total;
        Self {
            addresses,
            lines: cart.lines().to_vec(),
            item_count: cart.item_count(),
            order_count,
            subtotal,
            delivery_total,
            total,
            total_display: Price::inr(total).display(),
        }
    }
}

/// Split a cart into one order per farm, in the order farms first appear.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty cart.
pub fn plan_orders(
    cart: &Cart,
    user_id: UserId,
    delivery_address_id: AddressId,
    delivery_charge: Decimal,
) -> Result<Vec<NewOrder>, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    Ok(cart
        .group_by_organization()
        .into_iter()
        .map(|(organization_id, lines)| NewOrder {
            user_id,
            organization_id,
            delivery_address_id,
            delivery_charge,
            items: lines
                .iter()
                .map(|line| OrderLineInput {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
        })
        .collect())
}

pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    session: &'a Session,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session) -> Self {
        Self { pool, session }
    }

    /// Saved addresses and cart totals for the checkout page.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Session` or `Repository` on storage failure.
    pub async fn summary(
        &self,
        user_id: UserId,
        delivery_charge: Decimal,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let cart = load_session_cart(self.session).await?;
        let addresses = AddressRepository::new(self.pool)
            .list_for_user(user_id)
            .await?;
        Ok(CheckoutSummary::new(addresses, &cart, delivery_charge))
    }

    /// Place one order per farm in the saved cart, then empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart, or the first
    /// [`PlaceOrderError`] hit, in which case no order is created.
    #[instrument(skip(self))]
    pub async fn place(
        &self,
        user_id: UserId,
        delivery_address_id: AddressId,
        delivery_charge: Decimal,
    ) -> Result<Vec<OrderId>, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        let cart = Cart::from_lines(cart::list_in(&mut tx, user_id).await?);
        let plans = plan_orders(&cart, user_id, delivery_address_id, delivery_charge)?;

        let mut order_ids = Vec::with_capacity(plans.len());
        for plan in &plans {
            order_ids.push(create_order_transaction(&mut tx, plan).await?);
        }
        tx.commit().await?;

        save_session_cart(self.session, &Cart::new()).await?;
        tracing::info!(
            user_id = %user_id,
            orders = order_ids.len(),
            "Checkout completed"
        );
        Ok(order_ids)
    }
}
