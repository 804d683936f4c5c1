//! HTTP route handlers for storefront.
//!
//! Every handler speaks JSON. Sign-in and role rules are enforced by path in
//! [`crate::middleware::guard_middleware`] and again by the extractors each
//! handler takes.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database)
//!
//! # Auth
//! POST /auth/signup                - Create an unverified account
//! POST /auth/verify                - Confirm the emailed code and sign in
//! POST /auth/resend                - Send a fresh code
//! POST /auth/login                 - Sign in
//! POST /auth/logout                - Sign out (cart is kept)
//! GET  /auth/me                    - Current user, if any
//!
//! # Catalog
//! GET  /products                   - Listing (?q=&category=&sort=&limit=)
//! GET  /products/featured          - Newest products (cached)
//! GET  /products/{id}              - Product detail
//! GET  /categories                 - Categories with counts (cached)
//! GET  /categories/{slug}          - Products in a category
//! GET  /farms                      - Active farms (cached)
//! GET  /farms/{id}                 - Farm with its products
//!
//! # Cart (customers)
//! GET    /cart                     - Cart contents
//! DELETE /cart                     - Empty the cart
//! POST   /cart/items               - Add a product
//! PATCH  /cart/items/{product_id}  - Set quantity (0 removes)
//! DELETE /cart/items/{product_id}  - Remove a product
//!
//! # Checkout (customers)
//! GET  /checkout                   - Addresses and totals
//! POST /checkout                   - Place one order per farm
//!
//! # Orders (customers)
//! GET  /orders                     - Order history
//! GET  /orders/{id}                - Order detail
//!
//! # Account (signed in)
//! GET    /account                  - Profile
//! PATCH  /account                  - Edit profile
//! GET    /account/addresses        - Saved addresses
//! POST   /account/addresses        - Add an address
//! PATCH  /account/addresses/{id}   - Edit an address
//! DELETE /account/addresses/{id}   - Remove an address
//!
//! # Owner console (organization accounts)
//! GET    /owner                    - Dashboard
//! GET    /owner/settings           - Farm profile
//! PATCH  /owner/settings           - Edit farm profile
//! GET    /owner/products           - All farm products
//! POST   /owner/products           - Add a product
//! GET    /owner/products/{id}      - Product
//! PATCH  /owner/products/{id}      - Edit a product
//! DELETE /owner/products/{id}      - Delete a product
//! GET    /owner/orders             - Farm orders (?status=)
//! GET    /owner/orders/{id}        - Order with customer details
//! POST   /owner/orders/{id}/advance - Move an order to its next status
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod farms;
pub mod orders;
pub mod owner;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{ClientIpKeyExtractor, api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify", post(auth::verify))
        .route("/resend", post(auth::resend))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter(client_ip))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/{id}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the farm directory routes router.
pub fn farm_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(farms::index))
        .route("/{id}", get(farms::show))
}

/// Create the cart routes router.
pub fn cart_routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .layer(api_rate_limiter(client_ip))
}

/// Create the checkout routes router.
pub fn checkout_routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place))
        .layer(api_rate_limiter(client_ip))
}

/// Create the customer order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::show).patch(account::update))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            patch(account::update_address).delete(account::delete_address),
        )
}

/// Create the owner console routes router.
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(owner::dashboard))
        .route(
            "/settings",
            get(owner::settings::show).patch(owner::settings::update),
        )
        .route(
            "/products",
            get(owner::products::index).post(owner::products::create),
        )
        .route(
            "/products/{id}",
            get(owner::products::show)
                .patch(owner::products::update)
                .delete(owner::products::delete),
        )
        .route("/orders", get(owner::orders::index))
        .route("/orders/{id}", get(owner::orders::show))
        .route("/orders/{id}/advance", post(owner::orders::advance))
}

/// Create all routes for the storefront.
///
/// `client_ip` keys the per-IP rate limits on auth, cart and checkout.
pub fn routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(client_ip))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/farms", farm_routes())
        .nest("/cart", cart_routes(client_ip))
        .nest("/checkout", checkout_routes(client_ip))
        .nest("/orders", order_routes())
        .nest("/account", account_routes())
        .nest("/owner", owner_routes())
}
