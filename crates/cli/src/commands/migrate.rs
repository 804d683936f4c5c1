//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ga-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded at
//! compile time.

use super::{CommandError, connect};

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the connection or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
