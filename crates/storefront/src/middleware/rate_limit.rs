//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: strict limits for `/auth/*` (~10/min)
//! - `api_rate_limiter`: relaxed limits for cart and checkout (~100/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor for the client IP.
///
/// By default the key is the socket peer address. With
/// `trust_proxy_headers` set, `CF-Connecting-IP`, `X-Forwarded-For` (first
/// hop) and `X-Real-IP` are consulted first, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self { trust_proxy_headers }
    }
}

fn header_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let parse = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };
    parse("cf-connecting-ip")
        .or_else(|| parse("x-forwarded-for"))
        .or_else(|| parse("x-real-ip"))
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        self.trust_proxy_headers
            .then(|| header_ip(req.headers()))
            .flatten()
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
/// This slows password guessing and verification-code brute forcing.
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(5)` are
/// always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(client_ip: ClientIpKeyExtractor) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(client_ip)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for cart and checkout: ~100 requests per minute per IP.
///
/// # Panics
///
/// This function will not panic. `per_second(1)` and `burst_size(50)` are
/// always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter(client_ip: ClientIpKeyExtractor) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(client_ip)
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}
