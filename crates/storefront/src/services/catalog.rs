//! Cached public catalog reads.
//!
//! The home page shelves (featured products, farms, categories) are read on
//! nearly every visit and change rarely, so they're cached in memory via
//! `moka` (5-minute TTL). Owner edits invalidate the affected entries.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::RepositoryError;
use crate::db::organizations::OrganizationRepository;
use crate::db::products::ProductRepository;
use crate::models::{CategorySummary, Organization, Product};

/// Cache key for catalog shelves.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Featured { limit: i64 },
    Farms { limit: i64 },
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Farms(Arc<Vec<Organization>>),
    Categories(Arc<Vec<CategorySummary>>),
}

/// In-memory cache over the catalog repositories.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .support_invalidation_closures()
            .build();
        Self { cache }
    }

    /// Newest available products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on a cache miss that fails to load.
    #[instrument(skip(self, pool))]
    pub async fn featured(
        &self,
        pool: &PgPool,
        limit: i64,
    ) -> Result<Arc<Vec<Product>>, RepositoryError> {
        let key = CacheKey::Featured { limit };
        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(pool).featured(limit).await?);
        self.cache
            .insert(key, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// Active farms.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on a cache miss that fails to load.
    #[instrument(skip(self, pool))]
    pub async fn farms(
        &self,
        pool: &PgPool,
        limit: i64,
    ) -> Result<Arc<Vec<Organization>>, RepositoryError> {
        let key = CacheKey::Farms { limit };
        if let Some(CacheValue::Farms(farms)) = self.cache.get(&key).await {
            debug!("Cache hit for farms");
            return Ok(farms);
        }

        let farms = Arc::new(OrganizationRepository::new(pool).list_active(limit).await?);
        self.cache
            .insert(key, CacheValue::Farms(Arc::clone(&farms)))
            .await;
        Ok(farms)
    }

    /// Categories with product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on a cache miss that fails to load.
    pub async fn categories(
        &self,
        pool: &PgPool,
    ) -> Result<Arc<Vec<CategorySummary>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(ProductRepository::new(pool).categories().await?);
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// Drop product shelves after a product is created, edited or deleted.
    pub async fn invalidate_products(&self) {
        self.cache.invalidate(&CacheKey::Categories).await;
        // Featured entries are keyed by limit.
        if let Err(e) = self
            .cache
            .invalidate_entries_if(|key, _| matches!(key, CacheKey::Featured { .. }))
        {
            debug!(error = %e, "Falling back to full catalog invalidation");
            self.invalidate_all().await;
        }
    }

    /// Drop farm and product shelves after a farm's settings change.
    pub async fn invalidate_farms(&self) {
        self.invalidate_all().await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalidate_all_empties_cache() {
        let catalog = CatalogCache::new();
        catalog
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(Arc::new(Vec::new())))
            .await;
        assert!(catalog.cache.get(&CacheKey::Categories).await.is_some());

        catalog.invalidate_all().await;
        assert!(catalog.cache.get(&CacheKey::Categories).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_farms_drops_farm_shelf() {
        let catalog = CatalogCache::new();
        let key = CacheKey::Farms { limit: 20 };
        catalog
            .cache
            .insert(key.clone(), CacheValue::Farms(Arc::new(Vec::new())))
            .await;

        catalog.invalidate_farms().await;
        assert!(catalog.cache.get(&key).await.is_none());
    }
}
