//! Farms, products and categories.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use green_aura_core::{CartLine, OrganizationId, ProductId, UserId};

/// A field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    #[must_use]
    pub const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// A farm selling through the storefront.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Organization {
    pub id: OrganizationId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Owner edits to their organization profile. Absent fields are left as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: Option<bool>,
}

impl OrganizationUpdate {
    /// # Errors
    ///
    /// Rejects a blank name and out-of-range coordinates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::new("name", "cannot be empty"));
        }
        if self.latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            return Err(ValidationError::new("latitude", "must be between -90 and 90"));
        }
        if self.longitude.is_some_and(|lng| !(-180.0..=180.0).contains(&lng)) {
            return Err(ValidationError::new("longitude", "must be between -180 and 180"));
        }
        Ok(())
    }
}

/// A product listed by a farm.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub unit: String,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether a customer can order `quantity` units right now.
    #[must_use]
    pub fn can_fulfil(&self, quantity: u32) -> bool {
        self.is_available && i64::from(self.stock_quantity) >= i64::from(quantity)
    }

    /// A cart line for `quantity` units at the current price.
    #[must_use]
    pub fn cart_line(&self, quantity: u32) -> CartLine {
        CartLine {
            product_id: self.id,
            organization_id: self.organization_id,
            name: self.name.clone(),
            unit: self.unit.clone(),
            unit_price: self.price,
            image_url: self.image_url.clone(),
            quantity,
        }
    }
}

/// Fields for a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub unit: String,
    #[serde(default)]
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

const fn default_true() -> bool {
    true
}

impl NewProduct {
    /// # Errors
    ///
    /// Requires a name, a positive price, a unit and non-negative stock.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_product_fields(
            Some(&self.name),
            Some(self.price),
            Some(&self.unit),
            Some(self.stock_quantity),
        )
    }
}

/// Owner edits to a product. Absent fields are left as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub unit: Option<String>,
    pub stock_quantity: Option<i32>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

impl ProductUpdate {
    /// # Errors
    ///
    /// Applies the same rules as [`NewProduct::validate`] to present fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_product_fields(
            self.name.as_deref(),
            self.price,
            self.unit.as_deref(),
            self.stock_quantity,
        )
    }
}

/// Prices are stored as `NUMERIC(10, 2)`.
const PRICE_SCALE: u32 = 2;

/// Smallest price the column can't hold.
fn price_ceiling() -> Decimal {
    Decimal::from(100_000_000_u32)
}

fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::new("price", "must be greater than 0"));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(ValidationError::new("price", "can't have more than 2 decimal places"));
    }
    if price >= price_ceiling() {
        return Err(ValidationError::new("price", "must be less than 100000000"));
    }
    Ok(())
}

fn validate_product_fields(
    name: Option<&str>,
    price: Option<Decimal>,
    unit: Option<&str>,
    stock: Option<i32>,
) -> Result<(), ValidationError> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(ValidationError::new("name", "is required"));
    }
    if let Some(price) = price {
        validate_price(price)?;
    }
    if unit.is_some_and(|u| u.trim().is_empty()) {
        return Err(ValidationError::new("unit", "is required"));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(ValidationError::new("stock_quantity", "cannot be negative"));
    }
    Ok(())
}

/// A category with the number of available products in it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategorySummary {
    pub category: String,
    pub product_count: i64,
}

impl CategorySummary {
    /// URL slug for this category, e.g. `Leafy Greens` -> `leafy-greens`.
    #[must_use]
    pub fn slug(&self) -> String {
        self.category.trim().to_lowercase().replace(' ', "-")
    }
}

/// Turn a category slug back into a category name to match against.
///
/// The slug is percent-decoded and dashes become spaces. Matching is
/// case-insensitive, so the case of the result does not matter.
#[must_use]
pub fn category_from_slug(slug: &str) -> String {
    let decoded = urlencoding::decode(slug).map_or_else(|_| slug.to_owned(), |s| s.into_owned());
    decoded.replace('-', " ").trim().to_owned()
}

/// Sort orders for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    /// SQL `ORDER BY` clause. Only ever built from this fixed set.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC",
            Self::PriceAsc => "p.price ASC, p.created_at DESC",
            Self::PriceDesc => "p.price DESC, p.created_at DESC",
            Self::Name => "lower(p.name) ASC",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Tomatoes".to_owned(),
            description: None,
            category: Some("Vegetables".to_owned()),
            price: Decimal::new(40, 0),
            unit: "kg".to_owned(),
            stock_quantity: 10,
            image_url: None,
            is_available: true,
        }
    }

    #[test]
    fn test_new_product_valid() {
        assert!(new_product().validate().is_ok());
    }

    #[test]
    fn test_new_product_requires_name_and_positive_price() {
        let mut p = new_product();
        p.name = "  ".to_owned();
        assert_eq!(p.validate().unwrap_err().field, "name");

        let mut p = new_product();
        p.price = Decimal::ZERO;
        assert_eq!(p.validate().unwrap_err().field, "price");

        let mut p = new_product();
        p.stock_quantity = -1;
        assert_eq!(p.validate().unwrap_err().field, "stock_quantity");
    }

    #[test]
    fn test_price_must_fit_the_column() {
        for bad in [
            Decimal::new(1, 3),
            Decimal::new(19_999, 3),
            Decimal::from(100_000_000_u32),
            Decimal::from(250_000_000_u32),
        ] {
            let mut p = new_product();
            p.price = bad;
            assert_eq!(p.validate().unwrap_err().field, "price", "{bad}");
        }

        for good in [
            Decimal::new(1, 2),
            Decimal::new(10_500, 3),
            Decimal::new(9_999_999_999, 2),
        ] {
            let mut p = new_product();
            p.price = good;
            assert!(p.validate().is_ok(), "{good}");
        }

        let update = ProductUpdate {
            price: Some(Decimal::new(1, 3)),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_product_update_checks_present_fields_only() {
        assert!(ProductUpdate::default().validate().is_ok());
        let update = ProductUpdate {
            price: Some(Decimal::new(-5, 0)),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_category_from_slug() {
        assert_eq!(category_from_slug("leafy-greens"), "leafy greens");
        assert_eq!(category_from_slug("Dairy%20%26%20Eggs"), "Dairy & Eggs");
        assert_eq!(category_from_slug("fruits"), "fruits");
    }

    #[test]
    fn test_category_slug() {
        let summary = CategorySummary {
            category: "Leafy Greens".to_owned(),
            product_count: 3,
        };
        assert_eq!(summary.slug(), "leafy-greens");
        assert_eq!(category_from_slug(&summary.slug()), "leafy greens");
    }

    #[test]
    fn test_product_sort_deserialize() {
        let sort: ProductSort = serde_json::from_str("\"price_desc\"").unwrap();
        assert_eq!(sort, ProductSort::PriceDesc);
    }

    #[test]
    fn test_organization_update_validation() {
        let update = OrganizationUpdate {
            latitude: Some(120.0),
            ..OrganizationUpdate::default()
        };
        assert_eq!(update.validate().unwrap_err().field, "latitude");
    }
}
