//! Owner console handlers.
//!
//! Every handler takes [`OwnerOrganization`], which resolves the signed-in
//! organization account's farm and creates it on first use. Queries are
//! always scoped to that farm.

pub mod orders;
pub mod products;
pub mod settings;

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::OwnerOrganization;
use crate::services::orders::{Dashboard, OrderService};
use crate::state::AppState;

/// GET /owner
#[instrument(skip(state, owner), fields(organization_id = %owner.organization.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    owner: OwnerOrganization,
) -> Result<Json<Dashboard>> {
    let dashboard = OrderService::new(state.pool())
        .dashboard(owner.organization)
        .await?;
    Ok(Json(dashboard))
}
