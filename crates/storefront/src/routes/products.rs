//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use green_aura_core::ProductId;

use crate::db::products::{ProductQuery, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Product, ProductSort};
use crate::state::AppState;

/// Default page size for product listings.
pub const DEFAULT_LIMIT: i64 = 48;

/// Largest page a client may ask for.
pub const MAX_LIMIT: i64 = 100;

/// Query parameters for `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<ProductSort>,
    pub limit: Option<i64>,
}

impl ProductListParams {
    /// Repository query with blank filters dropped and the limit clamped.
    #[must_use]
    pub fn into_query(self) -> ProductQuery {
        ProductQuery {
            search: non_blank(self.q),
            category: non_blank(self.category),
            organization_id: None,
            sort: self.sort.unwrap_or_default(),
            limit: clamp_limit(self.limit),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Clamp a client-supplied page size to `1..=MAX_LIMIT`.
#[must_use]
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT))
}

/// GET /products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list_available(&params.into_query())
        .await?;
    Ok(Json(products))
}

/// GET /products/featured
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state
        .catalog()
        .featured(state.pool(), state.config().featured_limit)
        .await?;
    Ok(Json(Vec::clone(&products)))
}

/// GET /products/{id}
///
/// Hidden products and products of inactive farms are not found.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_public(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_LIMIT);
        assert_eq!(clamp_limit(Some(20)), 20);
    }

    #[test]
    fn test_into_query_drops_blank_filters() {
        let params = ProductListParams {
            q: Some("  ".to_owned()),
            category: Some(" Fruits ".to_owned()),
            sort: Some(ProductSort::PriceAsc),
            limit: None,
        };
        let query = params.into_query();
        assert_eq!(query.search, None);
        assert_eq!(query.category.as_deref(), Some("Fruits"));
        assert_eq!(query.sort, ProductSort::PriceAsc);
        assert_eq!(query.limit, DEFAULT_LIMIT);
    }
}
