//! In-process tests of the storefront router.
//!
//! These run against [`green_aura_integration_tests::offline_state`], so only
//! paths that never reach the database are exercised here: health, the
//! route guard for anonymous visitors and the response middleware.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;

use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use green_aura_integration_tests::offline_state;
use green_aura_storefront::app;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_json(uri: &str) -> Request<Body> {
    get_json_from(uri, "203.0.113.7")
}

/// A JSON request from peer 192.0.2.10 claiming to be forwarded for `forwarded`.
fn get_json_from(uri: &str, forwarded: &str) -> Request<Body> {
    let peer: SocketAddr = "192.0.2.10:40000".parse().unwrap();
    let mut request = Request::builder()
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .header("x-forwarded-for", forwarded)
        .body(Body::empty())
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

#[tokio::test]
async fn test_health_is_ok() {
    let response = app(offline_state()).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let response = app(offline_state()).oneshot(get("/health")).await.unwrap();
    let headers = response.headers();

    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-1234")
        .body(Body::empty())
        .unwrap();
    let response = app(offline_state()).oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "edge-1234");
}

#[tokio::test]
async fn test_anonymous_json_client_gets_401_on_protected_routes() {
    for uri in ["/cart", "/checkout", "/orders", "/account", "/owner/orders"] {
        let response = app(offline_state()).oneshot(get_json(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body = body_json(response).await;
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_anonymous_browser_is_redirected_to_login() {
    let response = app(offline_state()).oneshot(get("/owner")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/auth/login");
}

#[tokio::test]
async fn test_guard_prefixes_are_segment_aware() {
    // `/ordersx` is not `/orders`, so it falls through to a plain 404.
    let response = app(offline_state())
        .oneshot(get_json("/ordersx"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_me_is_null_when_signed_out() {
    let response = app(offline_state())
        .oneshot(get_json("/auth/me"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn test_auth_limit_ignores_forwarded_for_without_trusted_proxy() {
    let app = app(offline_state());
    let mut statuses = Vec::new();
    for n in 0..8 {
        let forwarded = format!("198.51.100.{n}");
        let response = app
            .clone()
            .oneshot(get_json_from("/auth/me", &forwarded))
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert!(statuses[..5].iter().all(|s| *s == StatusCode::OK), "{statuses:?}");
    assert!(
        statuses[5..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS),
        "{statuses:?}"
    );
}
