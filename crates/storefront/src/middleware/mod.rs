//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Route guard (sign-in and role rules by path)
//! 7. Rate limiting (governor), on `/auth`, `/cart` and `/checkout` only

pub mod auth;
pub mod guard;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, OwnerOrganization, RequireAuth, RequireCustomer, RequireOrganization,
    clear_current_user, set_current_user,
};
pub use guard::guard_middleware;
pub use rate_limit::{ClientIpKeyExtractor, api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
