//! End-to-end flows against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`ga-cli migrate`)
//! - The storefront running (`cargo run -p green-aura-storefront`)
//! - `STOREFRONT_DATABASE_URL` pointing at the same database, to read
//!   verification codes
//!
//! - The storefront started with `STOREFRONT_TRUST_PROXY_HEADERS=true`, so
//!   each client has its own rate-limit bucket
//!
//! Run with: `cargo test -p green-aura-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use green_aura_integration_tests::{
    TEST_PASSWORD, database, expect_json, json_client, signed_in_client, storefront_base_url,
    unique_email, verification_code,
};

/// Create a product as `owner` and return it.
async fn create_product(owner: &Client, name: &str, price: &str, stock: i32) -> Value {
    let base_url = storefront_base_url();
    expect_json(
        owner.post(format!("{base_url}/owner/products")).json(&json!({
            "name": name,
            "category": "Vegetables",
            "price": price,
            "unit": "kg",
            "stock_quantity": stock,
        })),
        StatusCode::CREATED,
    )
    .await
}

/// Save a delivery address for `customer` and return its ID.
async fn create_address(customer: &Client) -> String {
    let base_url = storefront_base_url();
    let address = expect_json(
        customer
            .post(format!("{base_url}/account/addresses"))
            .json(&json!({
                "address_line_1": "12 MG Road",
                "city": "Bengaluru",
                "pincode": "560001",
                "address_type": "Home",
            })),
        StatusCode::CREATED,
    )
    .await;
    address["id"].as_str().unwrap_or_default().to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_readiness_checks_database() {
    let resp = json_client()
        .get(format!("{}/health/ready", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_signup_verify_logout_login() {
    let pool = database().await;
    let base_url = storefront_base_url();
    let (client, email) = signed_in_client(&pool, "customer").await;

    let me = expect_json(client.get(format!("{base_url}/auth/me")), StatusCode::OK).await;
    assert_eq!(me["user"]["email"], email.as_str());
    assert_eq!(me["user"]["email_verified"], true);

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let session = expect_json(
        client
            .post(format!("{base_url}/auth/login"))
            .json(&json!({ "email": email, "password": TEST_PASSWORD })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(session["redirect"], "/");
    assert_eq!(session["user"]["role"], "customer");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_unverified_account_cannot_log_in() {
    let client = json_client();
    let base_url = storefront_base_url();
    let email = unique_email("unverified");

    expect_json(
        client.post(format!("{base_url}/auth/signup")).json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
        })),
        StatusCode::CREATED,
    )
    .await;

    expect_json(
        client
            .post(format!("{base_url}/auth/login"))
            .json(&json!({ "email": email, "password": TEST_PASSWORD })),
        StatusCode::FORBIDDEN,
    )
    .await;

    expect_json(
        client
            .post(format!("{base_url}/auth/signup"))
            .json(&json!({ "email": email, "password": TEST_PASSWORD })),
        StatusCode::CONFLICT,
    )
    .await;
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_verify_never_signs_in_to_a_verified_account() {
    let pool = database().await;
    let base_url = storefront_base_url();
    let (_victim, email) = signed_in_client(&pool, "customer").await;

    let stranger = json_client();
    for code in ["000000-wrong", "000000", ""] {
        let resp = stranger
            .post(format!("{base_url}/auth/verify"))
            .json(&json!({ "email": email, "code": code }))
            .send()
            .await
            .expect("Failed to post verify");
        assert!(resp.status().is_client_error(), "code {code:?}: {}", resp.status());
    }

    let me = expect_json(stranger.get(format!("{base_url}/auth/me")), StatusCode::OK).await;
    assert!(me["user"].is_null());
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wrong_codes_revoke_the_verification_code() {
    let pool = database().await;
    let base_url = storefront_base_url();
    let email = unique_email("guessed");

    expect_json(
        json_client().post(format!("{base_url}/auth/signup")).json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
        })),
        StatusCode::CREATED,
    )
    .await;
    let code = verification_code(&pool, &email).await;

    // Every guess comes from a fresh client, so only the per-code counter applies.
    for _ in 0..4 {
        expect_json(
            json_client()
                .post(format!("{base_url}/auth/verify"))
                .json(&json!({ "email": email, "code": "not-a-code" })),
            StatusCode::BAD_REQUEST,
        )
        .await;
    }
    expect_json(
        json_client()
            .post(format!("{base_url}/auth/verify"))
            .json(&json!({ "email": email, "code": "not-a-code" })),
        StatusCode::TOO_MANY_REQUESTS,
    )
    .await;

    // The revoked code no longer works, even when correct.
    expect_json(
        json_client()
            .post(format!("{base_url}/auth/verify"))
            .json(&json!({ "email": email, "code": code })),
        StatusCode::BAD_REQUEST,
    )
    .await;

    let resp = json_client()
        .post(format!("{base_url}/auth/resend"))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to resend");
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let fresh = verification_code(&pool, &email).await;
    expect_json(
        json_client()
            .post(format!("{base_url}/auth/verify"))
            .json(&json!({ "email": email, "code": fresh })),
        StatusCode::OK,
    )
    .await;
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_login_survives_a_stale_session_cart() {
    let pool = database().await;
    let base_url = storefront_base_url();

    let (owner, _) = signed_in_client(&pool, "organization").await;
    let product = create_product(&owner, "Curry Leaves", "15.00", 5).await;
    let product_id = product["id"].as_str().unwrap_or_default().to_string();

    let (customer, email) = signed_in_client(&pool, "customer").await;
    expect_json(
        customer
            .post(format!("{base_url}/cart/items"))
            .json(&json!({ "product_id": product_id, "quantity": 1 })),
        StatusCode::OK,
    )
    .await;
    let resp = customer
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The product disappears while the session cart still holds it.
    let resp = owner
        .delete(format!("{base_url}/owner/products/{product_id}"))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let session = expect_json(
        customer
            .post(format!("{base_url}/auth/login"))
            .json(&json!({ "email": email, "password": TEST_PASSWORD })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(session["user"]["email"], email.as_str());

    let cart = expect_json(customer.get(format!("{base_url}/cart")), StatusCode::OK).await;
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_roles_are_kept_apart() {
    let pool = database().await;
    let base_url = storefront_base_url();
    let (customer, _) = signed_in_client(&pool, "customer").await;
    let (owner, _) = signed_in_client(&pool, "organization").await;

    let body = expect_json(customer.get(format!("{base_url}/owner")), StatusCode::FORBIDDEN).await;
    assert_eq!(body["redirect"], "/");

    let body = expect_json(owner.get(format!("{base_url}/cart")), StatusCode::FORBIDDEN).await;
    assert_eq!(body["redirect"], "/owner");

    // Signed-in users are sent away from the auth pages.
    let body = expect_json(
        owner
            .post(format!("{base_url}/auth/login"))
            .json(&json!({ "email": "x@example.com", "password": "irrelevant" })),
        StatusCode::FORBIDDEN,
    )
    .await;
    assert_eq!(body["redirect"], "/owner");
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_order_lifecycle() {
    let pool = database().await;
    let base_url = storefront_base_url();

    // Owner lists a product; the farm is created on first visit.
    let (owner, _) = signed_in_client(&pool, "organization").await;
    let dashboard = expect_json(owner.get(format!("{base_url}/owner")), StatusCode::OK).await;
    assert_eq!(dashboard["product_count"], 0);
    let product = create_product(&owner, "Heirloom Tomatoes", "40.00", 10).await;
    let product_id = product["id"].as_str().unwrap_or_default().to_string();

    // Customer buys three.
    let (customer, _) = signed_in_client(&pool, "customer").await;
    let address_id = create_address(&customer).await;

    let cart = expect_json(
        customer
            .post(format!("{base_url}/cart/items"))
            .json(&json!({ "product_id": product_id, "quantity": 3 })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(cart["item_count"], 3);

    let summary = expect_json(customer.get(format!("{base_url}/checkout")), StatusCode::OK).await;
    assert_eq!(summary["order_count"], 1);

    let placed = expect_json(
        customer
            .post(format!("{base_url}/checkout"))
            .json(&json!({ "address_id": address_id })),
        StatusCode::CREATED,
    )
    .await;
    let order_id = placed["order_ids"][0].as_str().unwrap_or_default().to_string();

    // The cart is empty and stock went down.
    let cart = expect_json(customer.get(format!("{base_url}/cart")), StatusCode::OK).await;
    assert_eq!(cart["item_count"], 0);
    let product = expect_json(
        owner.get(format!("{base_url}/owner/products/{product_id}")),
        StatusCode::OK,
    )
    .await;
    assert_eq!(product["stock_quantity"], 7);

    let order = expect_json(
        customer.get(format!("{base_url}/orders/{order_id}")),
        StatusCode::OK,
    )
    .await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment"]["status"], "pending");
    assert_eq!(order["items"][0]["quantity"], 3);

    // Owner walks it through the chain; skipping ahead is refused.
    expect_json(
        owner
            .post(format!("{base_url}/owner/orders/{order_id}/advance"))
            .json(&json!({ "status": "delivered" })),
        StatusCode::CONFLICT,
    )
    .await;
    for expected in ["confirmed", "out_for_delivery", "delivered"] {
        let order = expect_json(
            owner.post(format!("{base_url}/owner/orders/{order_id}/advance")),
            StatusCode::OK,
        )
        .await;
        assert_eq!(order["status"], expected);
    }
    expect_json(
        owner.post(format!("{base_url}/owner/orders/{order_id}/advance")),
        StatusCode::CONFLICT,
    )
    .await;

    let detail = expect_json(
        owner.get(format!("{base_url}/owner/orders/{order_id}")),
        StatusCode::OK,
    )
    .await;
    assert_eq!(detail["status"], "delivered");
    assert_eq!(detail["payment"]["status"], "completed");
    assert!(detail["customer"]["email"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cart_rejects_more_than_stock() {
    let pool = database().await;
    let base_url = storefront_base_url();

    let (owner, _) = signed_in_client(&pool, "organization").await;
    let product = create_product(&owner, "Okra", "30.00", 2).await;
    let product_id = product["id"].as_str().unwrap_or_default().to_string();

    let (customer, _) = signed_in_client(&pool, "customer").await;
    expect_json(
        customer
            .post(format!("{base_url}/cart/items"))
            .json(&json!({ "product_id": product_id, "quantity": 3 })),
        StatusCode::CONFLICT,
    )
    .await;

    // Quantity 0 removes the line.
    expect_json(
        customer
            .post(format!("{base_url}/cart/items"))
            .json(&json!({ "product_id": product_id, "quantity": 2 })),
        StatusCode::OK,
    )
    .await;
    let cart = expect_json(
        customer
            .patch(format!("{base_url}/cart/items/{product_id}"))
            .json(&json!({ "quantity": 0 })),
        StatusCode::OK,
    )
    .await;
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_with_empty_cart_fails() {
    let pool = database().await;
    let base_url = storefront_base_url();
    let (customer, _) = signed_in_client(&pool, "customer").await;
    let address_id = create_address(&customer).await;

    expect_json(
        customer
            .post(format!("{base_url}/checkout"))
            .json(&json!({ "address_id": address_id })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_one_cart_checks_out_once() {
    let pool = database().await;
    let base_url = storefront_base_url();

    let (owner, _) = signed_in_client(&pool, "organization").await;
    let product = create_product(&owner, "Drumsticks", "60.00", 10).await;
    let product_id = product["id"].as_str().unwrap_or_default().to_string();

    let (customer, _) = signed_in_client(&pool, "customer").await;
    let address_id = create_address(&customer).await;
    expect_json(
        customer
            .post(format!("{base_url}/cart/items"))
            .json(&json!({ "product_id": product_id, "quantity": 1 })),
        StatusCode::OK,
    )
    .await;

    let place = || {
        customer
            .post(format!("{base_url}/checkout"))
            .json(&json!({ "address_id": address_id }))
            .send()
    };
    let (first, second) = tokio::join!(place(), place());
    let mut statuses = [
        first.expect("Checkout failed").status(),
        second.expect("Checkout failed").status(),
    ];
    statuses.sort_by_key(StatusCode::as_u16);
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let orders = expect_json(customer.get(format!("{base_url}/orders")), StatusCode::OK).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(1));

    let product = expect_json(
        owner.get(format!("{base_url}/owner/products/{product_id}")),
        StatusCode::OK,
    )
    .await;
    assert_eq!(product["stock_quantity"], 9);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_orders_of_other_customers_are_not_found() {
    let pool = database().await;
    let base_url = storefront_base_url();
    let (customer, _) = signed_in_client(&pool, "customer").await;

    let missing = uuid::Uuid::new_v4();
    expect_json(
        customer.get(format!("{base_url}/orders/{missing}")),
        StatusCode::NOT_FOUND,
    )
    .await;
}
