//! Farm directory route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use green_aura_core::OrganizationId;

use crate::db::organizations::OrganizationRepository;
use crate::db::products::{ProductQuery, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Organization, Product};
use crate::routes::products::MAX_LIMIT;
use crate::state::AppState;

/// A farm and what it currently sells.
#[derive(Debug, Serialize)]
pub struct FarmPage {
    pub organization: Organization,
    pub products: Vec<Product>,
}

/// GET /farms
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Organization>>> {
    let farms = state
        .catalog()
        .farms(state.pool(), state.config().farms_limit)
        .await?;
    Ok(Json(Vec::clone(&farms)))
}

/// GET /farms/{id}
///
/// Inactive farms are not found.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrganizationId>,
) -> Result<Json<FarmPage>> {
    let organization = OrganizationRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|org| org.is_active)
        .ok_or_else(|| AppError::NotFound(format!("Farm {id}")))?;

    let products = ProductRepository::new(state.pool())
        .list_available(&ProductQuery {
            organization_id: Some(id),
            limit: MAX_LIMIT,
            ..ProductQuery::default()
        })
        .await?;

    Ok(Json(FarmPage {
        organization,
        products,
    }))
}
