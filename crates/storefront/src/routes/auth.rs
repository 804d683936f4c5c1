//! Authentication route handlers.
//!
//! Sign-up creates an unverified account and mails (logs) a six digit code.
//! Verifying the code, or logging in afterwards, signs the user in and
//! reconciles the session cart with the saved one.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use green_aura_core::{Role, UserId};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthService, Registration};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Sign-up form.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Verification form.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

/// Resend form.
#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

/// Response to a successful sign-up.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub email: String,
    pub verification_required: bool,
}

/// A signed-in session and where the client should go next.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: CurrentUser,
    pub redirect: &'static str,
}

/// Who is signed in, if anyone.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<User>,
}

/// POST /auth/signup
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let registration = Registration {
        email: req.email,
        password: req.password,
        full_name: req.full_name,
        role: req.role,
    };
    let user = AuthService::new(state.pool()).register(&registration).await?;

    add_breadcrumb("auth", "Account registered", Some(&[("role", user.role.as_str())]));

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            email: user.email.to_string(),
            verification_required: true,
        }),
    ))
}

/// POST /auth/verify
///
/// A correct code verifies the account and signs the user in.
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<SessionResponse>> {
    let user = AuthService::new(state.pool())
        .verify(&req.email, &req.code)
        .await?;
    start_session(&state, &session, &user).await.map(Json)
}

/// POST /auth/resend
///
/// Always accepted, so the response doesn't reveal which emails exist.
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn resend(
    State(state): State<AppState>,
    Json(req): Json<ResendRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool()).resend_code(&req.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/login
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;
    start_session(&state, &session, &user).await.map(Json)
}

/// POST /auth/logout
///
/// The session cart stays behind for the next visit.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
#[instrument(skip(state, current))]
pub async fn me(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
) -> Result<Json<MeResponse>> {
    let user = match current {
        Some(current) => Some(load_user(&state, current.id).await?),
        None => None,
    };
    Ok(Json(MeResponse { user }))
}

async fn load_user(state: &AppState, user_id: UserId) -> Result<User> {
    Ok(AuthService::new(state.pool()).get_user(user_id).await?)
}

/// Put `user` in the session. Customers get their carts merged; a failed
/// merge leaves the session cart as it was and doesn't block sign-in.
async fn start_session(state: &AppState, session: &Session, user: &User) -> Result<SessionResponse> {
    let current = CurrentUser::from(user);
    set_current_user(session, &current).await?;

    if user.role == Role::Customer {
        let synced = CartService::new(state.pool(), session, Some(user.id))
            .sync_on_login(user.id)
            .await;
        if let Err(err) = synced {
            tracing::warn!(user_id = %user.id, error = %err, "Cart sync at sign-in failed");
        }
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User signed in");

    Ok(SessionResponse {
        user: current,
        redirect: user.role.landing_path(),
    })
}
