//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a verified customer
//! ga-cli user create -e asha@example.com -n "Asha Rao" -p 'long-password'
//!
//! # Create a verified farm owner (the farm is created too)
//! ga-cli user create -e farm@example.com -n "Sunrise Farm" -r organization -p 'long-password'
//! ```

use sqlx::PgPool;

use green_aura_core::{Email, Role};
use green_aura_storefront::db::organizations::OrganizationRepository;
use green_aura_storefront::db::users::UserRepository;
use green_aura_storefront::models::{NewUser, User};
use green_aura_storefront::services::auth::{hash_password, validate_password};

use super::{CommandError, connect};

/// Create a verified account.
///
/// # Errors
///
/// Returns `CommandError` for bad input, an existing email or a database failure.
pub async fn create(email: &str, name: &str, role: &str, password: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))?;
    let role: Role = role
        .parse()
        .map_err(|e: green_aura_core::RoleParseError| CommandError::Invalid(e.to_string()))?;
    validate_password(password)?;

    let pool = connect().await?;
    let user = create_verified(&pool, email, name, role, password).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role.as_str()
    );
    Ok(())
}

/// Insert a verified user, and their farm for organization accounts.
///
/// # Errors
///
/// Returns `CommandError::Repository` on a duplicate email or database failure.
pub async fn create_verified(
    pool: &PgPool,
    email: Email,
    name: &str,
    role: Role,
    password: &str,
) -> Result<User, CommandError> {
    let password_hash = hash_password(password)?;
    let new_user = NewUser {
        email,
        full_name: Some(name.trim().to_owned()).filter(|n| !n.is_empty()),
        role,
        email_verified: true,
    };
    let user = UserRepository::new(pool)
        .create_with_password(&new_user, &password_hash)
        .await?;

    if role == Role::Organization {
        let org = OrganizationRepository::new(pool)
            .get_or_create_for_owner(user.id, user.display_name())
            .await?;
        tracing::info!(organization_id = %org.id, name = %org.name, "Organization ready");
    }

    Ok(user)
}
