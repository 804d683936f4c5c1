//! Customer order history handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use green_aura_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::models::{OrderDetail, OrderSummary};
use crate::services::orders::OrderService;
use crate::state::AppState;

/// GET /orders
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
) -> Result<Json<Vec<OrderSummary>>> {
    Ok(Json(OrderService::new(state.pool()).history(user.id).await?))
}

/// GET /orders/{id}
///
/// Someone else's order is reported as not found.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let detail = OrderService::new(state.pool())
        .customer_detail(user.id, id)
        .await?;
    Ok(Json(detail))
}
