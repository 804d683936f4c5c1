//! Farm order fulfilment.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use green_aura_core::{OrderId, OrderStatus, OrderStatusError};

use crate::error::Result;
use crate::middleware::OwnerOrganization;
use crate::models::{Order, OrderDetail, OrderSummary};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Query parameters for `GET /owner/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
}

/// Body of `POST /owner/orders/{id}/advance`. Without a status the order
/// moves one step.
#[derive(Debug, Default, Deserialize)]
pub struct AdvanceRequest {
    pub status: Option<String>,
}

/// Parse an optional status filter. Blank means no filter.
///
/// # Errors
///
/// Returns `OrderStatusError::Unknown` for anything that isn't a status.
pub fn parse_status(raw: Option<&str>) -> std::result::Result<Option<OrderStatus>, OrderStatusError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .transpose()
}

/// GET /owner/orders
#[instrument(skip(state, owner), fields(organization_id = %owner.organization.id))]
pub async fn index(
    State(state): State<AppState>,
    owner: OwnerOrganization,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<OrderSummary>>> {
    let status = parse_status(params.status.as_deref())?;
    let orders = OrderService::new(state.pool())
        .for_organization(owner.organization.id, status)
        .await?;
    Ok(Json(orders))
}

/// GET /owner/orders/{id}
#[instrument(skip(state, owner), fields(organization_id = %owner.organization.id))]
pub async fn show(
    State(state): State<AppState>,
    owner: OwnerOrganization,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let detail = OrderService::new(state.pool())
        .owner_detail(owner.organization.id, id)
        .await?;
    Ok(Json(detail))
}

/// POST /owner/orders/{id}/advance
#[instrument(skip(state, owner, body), fields(organization_id = %owner.organization.id))]
pub async fn advance(
    State(state): State<AppState>,
    owner: OwnerOrganization,
    Path(id): Path<OrderId>,
    body: Option<Json<AdvanceRequest>>,
) -> Result<Json<Order>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let requested = parse_status(req.status.as_deref())?;
    let order = OrderService::new(state.pool())
        .advance_status(owner.organization.id, id, requested)
        .await?;

    tracing::info!(order_id = %id, status = %order.status, "Order status advanced");
    Ok(Json(order))
}
