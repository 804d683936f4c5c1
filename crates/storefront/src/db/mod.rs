//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users`, `user_passwords`, `email_verification_codes` - Accounts
//! - `tower_sessions.session` - Tower-sessions storage
//! - `organizations`, `products` - Farms and their catalog
//! - `user_addresses` - Delivery addresses
//! - `cart_items` - Persisted cart of signed-in users
//! - `orders`, `order_items`, `payments` - Placed orders
//!
//! Queries are runtime-checked (`sqlx::query_as` with `FromRow` rows).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p green-aura-cli -- migrate
//! ```

pub mod addresses;
pub mod cart;
pub mod orders;
pub mod organizations;
pub mod payments;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
