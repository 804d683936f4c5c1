//! Seed the catalog with farms and products from a YAML file.
//!
//! Seeding is idempotent: existing owners and farms are reused and products
//! whose name the farm already lists are skipped.
//!
//! ```yaml
//! farms:
//!   - owner_email: sunrise@example.com
//!     owner_password: change-me-please
//!     name: Sunrise Organic Farm
//!     description: Leafy greens from the Nilgiris
//!     address: Ooty, Tamil Nadu
//!     products:
//!       - name: Spinach
//!         category: Leafy Greens
//!         price: "30.00"
//!         unit: bunch
//!         stock_quantity: 40
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use green_aura_core::{Email, Role};
use green_aura_storefront::db::organizations::OrganizationRepository;
use green_aura_storefront::db::products::ProductRepository;
use green_aura_storefront::db::users::UserRepository;
use green_aura_storefront::models::{NewProduct, Organization, OrganizationUpdate};
use green_aura_storefront::services::auth::MIN_PASSWORD_LENGTH;

use super::{CommandError, connect, user::create_verified};

/// Top level of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub farms: Vec<SeedFarm>,
}

/// A farm, its owner account and its products.
#[derive(Debug, Deserialize)]
pub struct SeedFarm {
    pub owner_email: String,
    pub owner_password: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

impl SeedFarm {
    fn profile(&self) -> OrganizationUpdate {
        OrganizationUpdate {
            name: Some(self.name.clone()),
            description: self.description.clone(),
            address: self.address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            ..OrganizationUpdate::default()
        }
    }
}

/// What a seeding run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub farms: usize,
    pub inserted: usize,
    pub skipped: usize,
}

/// Every problem in a seed file, so they can be fixed in one pass.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut emails = HashSet::new();

    for (i, farm) in seed.farms.iter().enumerate() {
        let label = format!("farm #{} ({})", i + 1, farm.name);
        match Email::parse(&farm.owner_email) {
            Ok(email) => {
                if !emails.insert(email.as_str().to_owned()) {
                    errors.push(format!("{label}: owner email used by another farm"));
                }
            }
            Err(e) => errors.push(format!("{label}: {e}")),
        }
        if farm.owner_password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(format!(
                "{label}: owner_password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        if let Err(e) = farm.profile().validate() {
            errors.push(format!("{label}: {e}"));
        }

        let mut names = HashSet::new();
        for product in &farm.products {
            if let Err(e) = product.validate() {
                errors.push(format!("{label}: product {}: {e}", product.name));
            }
            if !names.insert(product.name.trim().to_lowercase()) {
                errors.push(format!("{label}: duplicate product {}", product.name));
            }
        }
    }

    errors
}

/// Seed farms and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, fails validation,
/// or a database operation fails.
pub async fn run(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed data from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    info!(farms = seed.farms.len(), "Parsed seed file");

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::Invalid(format!(
            "{} validation errors found",
            errors.len()
        )));
    }

    let pool = connect().await?;
    let result = seed_farms(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Farms: {}", result.farms);
    info!("  Products inserted: {}", result.inserted);
    info!("  Products skipped (already exist): {}", result.skipped);
    Ok(())
}

async fn seed_farms(pool: &PgPool, seed: &SeedFile) -> Result<SeedResult, CommandError> {
    let mut result = SeedResult::default();

    for farm in &seed.farms {
        let organization = ensure_farm(pool, farm).await?;
        result.farms += 1;

        let products = ProductRepository::new(pool);
        let existing: HashSet<String> = products
            .list_for_organization(organization.id)
            .await?
            .into_iter()
            .map(|p| p.name.trim().to_lowercase())
            .collect();

        for product in &farm.products {
            if existing.contains(&product.name.trim().to_lowercase()) {
                result.skipped += 1;
                continue;
            }
            products.create(organization.id, product).await?;
            result.inserted += 1;
        }
    }

    Ok(result)
}

/// The farm for `farm.owner_email`, creating the owner and farm if needed.
async fn ensure_farm(pool: &PgPool, farm: &SeedFarm) -> Result<Organization, CommandError> {
    let email = Email::parse(&farm.owner_email).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let owner = match UserRepository::new(pool).get_by_email(&email).await? {
        Some(user) if user.role == Role::Organization => user,
        Some(_) => {
            return Err(CommandError::Invalid(format!(
                "{} exists but is not an organization account",
                farm.owner_email
            )));
        }
        None => {
            create_verified(
                pool,
                email,
                &farm.name,
                Role::Organization,
                &farm.owner_password,
            )
            .await?
        }
    };

    let organizations = OrganizationRepository::new(pool);
    let organization = organizations
        .get_or_create_for_owner(owner.id, &farm.name)
        .await?;
    let organization = organizations
        .update(organization.id, &farm.profile())
        .await?;

    info!(organization_id = %organization.id, name = %organization.name, "Farm ready");
    Ok(organization)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SEED: &str = r#"
farms:
  - owner_email: sunrise@example.com
    owner_password: change-me-please
    name: Sunrise Organic Farm
    latitude: 11.41
    longitude: 76.69
    products:
      - name: Spinach
        category: Leafy Greens
        price: "30.00"
        unit: bunch
        stock_quantity: 40
      - name: Carrots
        price: "55"
        unit: kg
"#;

    #[test]
    fn test_parse_seed_file() {
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.farms.len(), 1);
        let farm = &seed.farms[0];
        assert_eq!(farm.products.len(), 2);
        assert_eq!(farm.products[1].stock_quantity, 0);
        assert!(farm.products[1].is_available);
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let mut seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        let farm = &mut seed.farms[0];
        farm.owner_email = "not-an-email".to_owned();
        farm.owner_password = "short".to_owned();
        farm.products[1].name = "spinach".to_owned();
        farm.products[0].price = rust_decimal::Decimal::ZERO;

        let errors = validate(&seed);
        assert_eq!(errors.len(), 4, "{errors:?}");
    }

    #[test]
    fn test_validate_rejects_shared_owner() {
        let mut seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        let second: SeedFile = serde_yaml::from_str(SEED).unwrap();
        seed.farms.extend(second.farms);
        let errors = validate(&seed);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("another farm"));
    }
}
