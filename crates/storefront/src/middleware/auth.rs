//! Authentication extractors.
//!
//! The route guard already turns away anonymous and wrong-role requests by
//! path; these extractors hand the signed-in user to handlers and enforce
//! the same rules for any route the guard's table doesn't cover.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use green_aura_core::Role;

use super::guard::{login_required, redirect_away, wants_json};
use crate::error::AppError;
use crate::models::{CurrentUser, Organization, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when a route's sign-in or role rule isn't met.
pub enum AuthRejection {
    /// Not signed in.
    Login { json: bool },
    /// Signed in with a role that belongs elsewhere.
    WrongRole { landing: &'static str, json: bool },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login { json } => login_required(json),
            Self::WrongRole { landing, json } => redirect_away(landing, json),
        }
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn require_role(parts: &Parts, role: Role) -> Result<CurrentUser, AuthRejection> {
    let json = wants_json(&parts.headers);
    let user = current_user(parts)
        .await
        .ok_or(AuthRejection::Login { json })?;
    if user.role == role {
        Ok(user)
    } else {
        Err(AuthRejection::WrongRole {
            landing: user.role.landing_path(),
            json,
        })
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let json = wants_json(&parts.headers);
        current_user(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection::Login { json })
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// A signed-in customer. Organization accounts are sent to `/owner`.
pub struct RequireCustomer(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, Role::Customer).await.map(Self)
    }
}

/// A signed-in organization account. Customers are sent to `/`.
pub struct RequireOrganization(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireOrganization
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, Role::Organization).await.map(Self)
    }
}

/// The signed-in owner together with their farm, created on first use.
pub struct OwnerOrganization {
    pub user: CurrentUser,
    pub organization: Organization,
}

impl FromRequestParts<AppState> for OwnerOrganization {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireOrganization(user) = RequireOrganization::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let organization = AuthService::new(state.pool())
            .ensure_organization(user.id)
            .await
            .map_err(|e| AppError::from(e).into_response())?
            .ok_or_else(|| {
                AppError::Forbidden("Account has no organization".to_owned()).into_response()
            })?;

        Ok(Self { user, organization })
    }
}

/// Store the signed-in user in the session.
///
/// The session ID is rotated first so a pre-login ID can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session (logout).
///
/// The cart is left in place.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
