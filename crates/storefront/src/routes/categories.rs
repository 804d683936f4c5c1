//! Category route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::db::products::{ProductQuery, ProductRepository};
use crate::error::Result;
use crate::models::{CategorySummary, Product, category_from_slug};
use crate::routes::products::{ProductListParams, clamp_limit};
use crate::state::AppState;

/// A category page.
#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub category: String,
    pub products: Vec<Product>,
}

/// GET /categories
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CategorySummary>>> {
    let categories = state.catalog().categories(state.pool()).await?;
    Ok(Json(Vec::clone(&categories)))
}

/// GET /categories/{slug}
///
/// An unknown category is an empty page, not an error.
#[instrument(skip(state, params))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<CategoryPage>> {
    let category = category_from_slug(&slug);
    let query = ProductQuery {
        category: Some(category.clone()),
        sort: params.sort.unwrap_or_default(),
        limit: clamp_limit(params.limit),
        ..ProductQuery::default()
    };
    let products = ProductRepository::new(state.pool())
        .list_available(&query)
        .await?;
    Ok(Json(CategoryPage { category, products }))
}
