//! Farm profile settings.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::organizations::OrganizationRepository;
use crate::error::Result;
use crate::middleware::OwnerOrganization;
use crate::models::{Organization, OrganizationUpdate};
use crate::state::AppState;

/// GET /owner/settings
pub async fn show(owner: OwnerOrganization) -> Json<Organization> {
    Json(owner.organization)
}

/// PATCH /owner/settings
#[instrument(skip(state, owner, update), fields(organization_id = %owner.organization.id))]
pub async fn update(
    State(state): State<AppState>,
    owner: OwnerOrganization,
    Json(update): Json<OrganizationUpdate>,
) -> Result<Json<Organization>> {
    update.validate()?;
    let organization = OrganizationRepository::new(state.pool())
        .update(owner.organization.id, &update)
        .await?;

    state.catalog().invalidate_farms().await;

    Ok(Json(organization))
}
