//! Account route handlers.
//!
//! Profile and saved delivery addresses of the signed-in user.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;
use tracing::instrument;

use green_aura_core::AddressId;

use crate::db::addresses::AddressRepository;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Address, AddressInput, CurrentUser, ProfileUpdate, User, session_keys};
use crate::state::AppState;

/// GET /account
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or(crate::db::RepositoryError::NotFound)?;
    Ok(Json(user))
}

/// PATCH /account
///
/// The session copy of the user is refreshed so the new name shows at once.
#[instrument(skip(state, session, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let update = ProfileUpdate {
        full_name: non_blank(update.full_name),
        phone_number: non_blank(update.phone_number),
        profile_picture_url: non_blank(update.profile_picture_url),
    };
    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, &update)
        .await?;

    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&updated))
        .await?;

    Ok(Json(updated))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// GET /account/addresses
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(addresses))
}

/// POST /account/addresses
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    let input = input.normalized()?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// PATCH /account/addresses/{id}
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>> {
    let input = input.normalized()?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?;
    Ok(Json(address))
}

/// DELETE /account/addresses/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
