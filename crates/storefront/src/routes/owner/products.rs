//! Farm catalog management.
//!
//! Each write drops the cached product shelves.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use green_aura_core::ProductId;

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::OwnerOrganization;
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::state::AppState;

/// GET /owner/products
///
/// Includes hidden and out-of-stock products.
#[instrument(skip(state, owner), fields(organization_id = %owner.organization.id))]
pub async fn index(
    State(state): State<AppState>,
    owner: OwnerOrganization,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list_for_organization(owner.organization.id)
        .await?;
    Ok(Json(products))
}

/// POST /owner/products
#[instrument(skip(state, owner, product), fields(organization_id = %owner.organization.id))]
pub async fn create(
    State(state): State<AppState>,
    owner: OwnerOrganization,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    product.validate()?;
    let created = ProductRepository::new(state.pool())
        .create(owner.organization.id, &product)
        .await?;
    state.catalog().invalidate_products().await;

    tracing::info!(product_id = %created.id, "Product created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /owner/products/{id}
#[instrument(skip(state, owner), fields(organization_id = %owner.organization.id))]
pub async fn show(
    State(state): State<AppState>,
    owner: OwnerOrganization,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_for_organization(owner.organization.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
}

/// PATCH /owner/products/{id}
#[instrument(skip(state, owner, update), fields(organization_id = %owner.organization.id))]
pub async fn update(
    State(state): State<AppState>,
    owner: OwnerOrganization,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    update.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(owner.organization.id, id, &update)
        .await?;
    state.catalog().invalidate_products().await;
    Ok(Json(product))
}

/// DELETE /owner/products/{id}
///
/// Products that appear in past orders can't be deleted; hide them instead.
#[instrument(skip(state, owner), fields(organization_id = %owner.organization.id))]
pub async fn delete(
    State(state): State<AppState>,
    owner: OwnerOrganization,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .delete(owner.organization.id, id)
        .await?;
    state.catalog().invalidate_products().await;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
