//! Route guard middleware.
//!
//! Applies the role table from [`green_aura_core::guard`] to every request
//! before it reaches a handler. Browsers get `303 See Other` redirects; JSON
//! clients get `401`/`403` with an error body instead.

use axum::{
    Json,
    extract::Request,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use green_aura_core::{Access, Role, decide};

use crate::models::{CurrentUser, session_keys};

/// Login page that unauthenticated browsers are sent to.
pub const LOGIN_PATH: &str = "/auth/login";

/// Whether the client asked for JSON rather than a page.
#[must_use]
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Response for a request that needs a signed-in user.
#[must_use]
pub fn login_required(json: bool) -> Response {
    if json {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Sign in required" })),
        )
            .into_response()
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

/// Response for a signed-in user who may not use this route.
#[must_use]
pub fn redirect_away(to: &'static str, json: bool) -> Response {
    if json {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Not available for this account", "redirect": to })),
        )
            .into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

async fn session_role(session: &Session) -> Option<Option<Role>> {
    match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user.map(|u| Some(u.role)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session in route guard");
            None
        }
    }
}

/// Middleware enforcing sign-in and role rules by path.
pub async fn guard_middleware(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let role = match session {
        Some(session) => session_role(&session).await,
        None => None,
    };

    match decide(request.uri().path(), role) {
        Access::Allow => next.run(request).await,
        Access::Login => login_required(wants_json(request.headers())),
        Access::Redirect(to) => {
            tracing::debug!(path = %request.uri().path(), to, "Route guard redirect");
            redirect_away(to, wants_json(request.headers()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!wants_json(&headers));

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain;q=0.5"),
        );
        assert!(wants_json(&headers));
    }

    #[test]
    fn test_login_required_responses() {
        assert_eq!(login_required(true).status(), StatusCode::UNAUTHORIZED);

        let redirect = login_required(false);
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect.headers()[header::LOCATION], LOGIN_PATH);
    }

    #[test]
    fn test_redirect_away_responses() {
        assert_eq!(redirect_away("/owner", true).status(), StatusCode::FORBIDDEN);

        let redirect = redirect_away("/owner", false);
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect.headers()[header::LOCATION], "/owner");
    }
}
