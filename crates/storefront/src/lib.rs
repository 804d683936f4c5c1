//! Green Aura Storefront library.
//!
//! The JSON storefront for customers and farm owners, provided as a library
//! so the binary, the CLI and tests share one router and one data layer.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    routing::get,
};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application: routes, middleware and state.
///
/// Sentry layers are added by the binary, outside of this router.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());
    let client_ip = middleware::ClientIpKeyExtractor::new(state.config().trust_proxy_headers);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(client_ip))
        .layer(axum::middleware::from_fn(middleware::guard_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
