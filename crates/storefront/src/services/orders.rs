//! Order history for customers and fulfilment for farms.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use green_aura_core::{OrderId, OrderStatus, OrderStatusError, OrganizationId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::{OrderRepository, StatusCount};
use crate::db::products::ProductRepository;
use crate::models::{Order, OrderDetail, OrderSummary, Organization};

/// Recent orders shown on the owner dashboard.
const DASHBOARD_RECENT_ORDERS: i64 = 5;

#[derive(Debug, Error)]
pub enum OrderServiceError {
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Status(#[from] OrderStatusError),

    /// Someone else advanced the order first.
    #[error("order status changed, reload and try again")]
    StatusChanged,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Owner console landing data.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub organization: Organization,
    pub product_count: i64,
    pub order_counts: Vec<StatusCount>,
    pub recent_orders: Vec<OrderSummary>,
}

/// Work out the status an advance request should move to.
///
/// With no explicit target the order moves one step. An explicit target
/// must be exactly the next step.
///
/// # Errors
///
/// Returns `OrderStatusError::Terminal` for delivered orders and
/// `InvalidTransition` for anything but the next step.
pub fn resolve_advance(
    current: OrderStatus,
    requested: Option<OrderStatus>,
) -> Result<OrderStatus, OrderStatusError> {
    match requested {
        Some(to) => current.transition_to(to),
        None => current.advance(),
    }
}

pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `OrderServiceError::Repository` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<OrderSummary>, OrderServiceError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// An order the customer placed. Other customers' orders are reported
    /// as missing.
    ///
    /// # Errors
    ///
    /// Returns `OrderServiceError::NotFound` if the user didn't place it.
    pub async fn customer_detail(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<OrderDetail, OrderServiceError> {
        let order = self
            .orders
            .get_for_user(user_id, id)
            .await?
            .ok_or(OrderServiceError::NotFound)?;
        Ok(self.orders.detail(order, false).await?)
    }

    /// # Errors
    ///
    /// Returns `OrderServiceError::Repository` if the query fails.
    pub async fn for_organization(
        &self,
        organization_id: OrganizationId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, OrderServiceError> {
        Ok(self
            .orders
            .list_for_organization(organization_id, status, None)
            .await?)
    }

    /// An order placed with the farm, including customer contact details.
    ///
    /// # Errors
    ///
    /// Returns `OrderServiceError::NotFound` if it belongs to another farm.
    pub async fn owner_detail(
        &self,
        organization_id: OrganizationId,
        id: OrderId,
    ) -> Result<OrderDetail, OrderServiceError> {
        let order = self
            .orders
            .get_for_organization(organization_id, id)
            .await?
            .ok_or(OrderServiceError::NotFound)?;
        Ok(self.orders.detail(order, true).await?)
    }

    /// Move an order one step along its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for other farms' orders, `Status` for a step that
    /// isn't the next one and `StatusChanged` if a concurrent update won.
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        organization_id: OrganizationId,
        id: OrderId,
        requested: Option<OrderStatus>,
    ) -> Result<Order, OrderServiceError> {
        let order = self
            .orders
            .get_for_organization(organization_id, id)
            .await?
            .ok_or(OrderServiceError::NotFound)?;

        let to = resolve_advance(order.status, requested)?;
        self.orders
            .advance_status(organization_id, id, order.status, to)
            .await?
            .ok_or(OrderServiceError::StatusChanged)
    }

    /// # Errors
    ///
    /// Returns `OrderServiceError::Repository` if a query fails.
    pub async fn dashboard(&self, organization: Organization) -> Result<Dashboard, OrderServiceError> {
        let product_count = self.products.count_for_organization(organization.id).await?;
        let order_counts = self.orders.status_counts(organization.id).await?;
        let recent_orders = self
            .orders
            .list_for_organization(organization.id, None, Some(DASHBOARD_RECENT_ORDERS))
            .await?;
        Ok(Dashboard {
            organization,
            product_count,
            order_counts,
            recent_orders,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_advance_defaults_to_next_step() {
        assert_eq!(
            resolve_advance(OrderStatus::Pending, None).unwrap(),
            OrderStatus::Confirmed
        );
        assert_eq!(
            resolve_advance(OrderStatus::OutForDelivery, None).unwrap(),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn test_resolve_advance_rejects_skips_and_reversals() {
        assert!(matches!(
            resolve_advance(OrderStatus::Pending, Some(OrderStatus::Delivered)),
            Err(OrderStatusError::InvalidTransition { .. })
        ));
        assert!(matches!(
            resolve_advance(OrderStatus::Confirmed, Some(OrderStatus::Pending)),
            Err(OrderStatusError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_resolve_advance_delivered_is_terminal() {
        assert!(matches!(
            resolve_advance(OrderStatus::Delivered, None),
            Err(OrderStatusError::Terminal(OrderStatus::Delivered))
        ));
    }

    #[test]
    fn test_resolve_advance_explicit_next() {
        assert_eq!(
            resolve_advance(OrderStatus::Confirmed, Some(OrderStatus::OutForDelivery)).unwrap(),
            OrderStatus::OutForDelivery
        );
    }
}
