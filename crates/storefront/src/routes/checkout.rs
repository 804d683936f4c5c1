//! Checkout route handlers.
//!
//! Payment is cash on delivery, so placing the order is the whole checkout.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use green_aura_core::{AddressId, OrderId};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireCustomer;
use crate::services::checkout::{CheckoutService, CheckoutSummary};
use crate::state::AppState;

/// Body of `POST /checkout`.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub address_id: AddressId,
}

/// The orders a checkout created, one per farm.
#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub order_ids: Vec<OrderId>,
}

/// GET /checkout
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
) -> Result<Json<CheckoutSummary>> {
    let summary = CheckoutService::new(state.pool(), &session)
        .summary(user.id, state.config().delivery_charge)
        .await?;
    Ok(Json(summary))
}

/// POST /checkout
#[instrument(skip(state, session, user, req), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>)> {
    let order_ids = CheckoutService::new(state.pool(), &session)
        .place(user.id, req.address_id, state.config().delivery_charge)
        .await?;

    let count = order_ids.len().to_string();
    add_breadcrumb("checkout", "Orders placed", Some(&[("count", count.as_str())]));

    Ok((StatusCode::CREATED, Json(PlaceOrderResponse { order_ids })))
}
