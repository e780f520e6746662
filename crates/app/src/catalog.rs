//! Catalog Cache
//!
//! Catalog lists are fetched once and kept in the local store. A cached list
//! is returned as long as it is non-empty; there is no expiry, so stale data
//! stays until it is invalidated by hand.

use std::{future::Future, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use till::catalog::{Brand, Category, Product};
use tracing::{debug, info, warn};

use crate::{
    backend::{ListQuery, Order},
    services::{BrandsService, CategoriesService, ProductsService, ServiceError},
    storage::{LocalStore, StoreError, keys},
};

/// Number of records fetched when a list is not cached yet.
pub const DEFAULT_PREFETCH_LIMIT: u32 = 50;

/// Every cache key, in prefetch order.
pub const CACHE_KEYS: [&str; 3] = [
    keys::PREFETCH_CATEGORIES,
    keys::PREFETCH_BRANDS,
    keys::PREFETCH_PRODUCTS,
];

/// Errors raised while filling the cache.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backend request failed.
    #[error("failed to load catalog: {0}")]
    Service(#[from] ServiceError),

    /// The local store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Cached catalog lists used for browsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    /// Categories
    pub categories: Vec<Category>,

    /// Brands
    pub brands: Vec<Brand>,

    /// Products, with stock as of when they were cached
    pub products: Vec<Product>,
}

/// Read-through cache of catalog lists.
#[derive(Clone)]
pub struct CatalogCache {
    store: LocalStore,
    categories: Arc<dyn CategoriesService>,
    brands: Arc<dyn BrandsService>,
    products: Arc<dyn ProductsService>,
    limit: u32,
}

impl CatalogCache {
    /// Create a cache over `store` that fills itself from the given services.
    pub fn new(
        store: LocalStore,
        categories: Arc<dyn CategoriesService>,
        brands: Arc<dyn BrandsService>,
        products: Arc<dyn ProductsService>,
    ) -> Self {
        Self {
            store,
            categories,
            brands,
            products,
            limit: DEFAULT_PREFETCH_LIMIT,
        }
    }

    /// Override the number of records fetched on a miss.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Return the list cached under `key` if present and non-empty, otherwise
    /// call `loader(limit)`, cache its result and return it.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the loader or the store fails.
    pub async fn prefetch<T, F, Fut>(
        &self,
        key: &str,
        limit: u32,
        loader: F,
    ) -> Result<Vec<T>, CatalogError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, ServiceError>>,
    {
        if let Some(cached) = self
            .store
            .get::<Vec<T>>(key)?
            .filter(|cached| !cached.is_empty())
        {
            debug!(key, count = cached.len(), "catalog cache hit");

            return Ok(cached);
        }

        let items = loader(limit).await?;

        self.store.set(key, &items)?;

        info!(key, count = items.len(), "catalog cache filled");

        Ok(items)
    }

    /// Cached categories, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the list has to be fetched and that fails.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let service = Arc::clone(&self.categories);

        self.prefetch(keys::PREFETCH_CATEGORIES, self.limit, |limit| async move {
            service
                .list_categories(ListQuery::new(limit, Order::asc("name")))
                .await
        })
        .await
    }

    /// Cached brands, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the list has to be fetched and that fails.
    pub async fn brands(&self) -> Result<Vec<Brand>, CatalogError> {
        let service = Arc::clone(&self.brands);

        self.prefetch(keys::PREFETCH_BRANDS, self.limit, |limit| async move {
            service
                .list_brands(ListQuery::new(limit, Order::asc("name")))
                .await
        })
        .await
    }

    /// Cached products, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the list has to be fetched and that fails.
    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        let service = Arc::clone(&self.products);

        self.prefetch(keys::PREFETCH_PRODUCTS, self.limit, |limit| async move {
            service
                .list_products(ListQuery::new(limit, Order::asc("name")))
                .await
        })
        .await
    }

    /// Fill every list for browsing. A list that cannot be loaded is logged
    /// and comes back empty so the cashier can keep working.
    pub async fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            categories: self.categories().await.unwrap_or_else(|error| {
                warn!(%error, "failed to load categories");
                Vec::new()
            }),
            brands: self.brands().await.unwrap_or_else(|error| {
                warn!(%error, "failed to load brands");
                Vec::new()
            }),
            products: self.products().await.unwrap_or_else(|error| {
                warn!(%error, "failed to load products");
                Vec::new()
            }),
        }
    }

    /// Drop the list cached under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be written.
    pub fn invalidate(&self, key: &str) -> Result<(), StoreError> {
        self.store.remove(key)
    }

    /// Drop every cached list.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be written.
    pub fn invalidate_all(&self) -> Result<(), StoreError> {
        CACHE_KEYS.iter().try_for_each(|key| self.invalidate(key))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        services::{MockBrandsService, MockCategoriesService, MockProductsService},
        test::fixtures,
    };

    fn cache(
        store: LocalStore,
        categories: MockCategoriesService,
        products: MockProductsService,
    ) -> CatalogCache {
        CatalogCache::new(
            store,
            Arc::new(categories),
            Arc::new(MockBrandsService::new()),
            Arc::new(products),
        )
    }

    #[tokio::test]
    async fn miss_fetches_with_limit_and_caches() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = LocalStore::open(dir.path())?;

        let mut categories = MockCategoriesService::new();

        categories
            .expect_list_categories()
            .once()
            .withf(|query| query.limit == DEFAULT_PREFETCH_LIMIT && query.offset == 0)
            .return_once(|_| Ok(vec![fixtures::category("c1", "Hair")]));

        let cache = cache(store.clone(), categories, MockProductsService::new());

        let first = cache.categories().await?;
        let second = cache.categories().await?;

        assert_eq!(first, second);
        assert_eq!(
            store.get::<Vec<Category>>(keys::PREFETCH_CATEGORIES)?,
            Some(first)
        );

        Ok(())
    }

    #[tokio::test]
    async fn empty_cached_list_is_refetched() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = LocalStore::open(dir.path())?;

        store.set(keys::PREFETCH_PRODUCTS, &Vec::<Product>::new())?;

        let mut products = MockProductsService::new();

        products
            .expect_list_products()
            .once()
            .return_once(|_| Ok(vec![fixtures::product("p1", 10, 5)]));

        let cache = cache(store, MockCategoriesService::new(), products);

        let loaded = cache.products().await?;

        assert_eq!(loaded.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn snapshot_degrades_to_empty_lists_on_failure() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = LocalStore::open(dir.path())?;

        let mut categories = MockCategoriesService::new();

        categories
            .expect_list_categories()
            .once()
            .return_once(|_| Err(ServiceError::NotFound("categories".to_string())));

        let mut brands = MockBrandsService::new();

        brands.expect_list_brands().once().return_once(|_| Ok(vec![]));

        let mut products = MockProductsService::new();

        products
            .expect_list_products()
            .once()
            .return_once(|_| Ok(vec![fixtures::product("p1", 10, 5)]));

        let cache = CatalogCache::new(
            store,
            Arc::new(categories),
            Arc::new(brands),
            Arc::new(products),
        );

        let snapshot = cache.snapshot().await;

        assert!(snapshot.categories.is_empty());
        assert!(snapshot.brands.is_empty());
        assert_eq!(snapshot.products.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn invalidate_all_forces_refetch() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = LocalStore::open(dir.path())?;

        let mut products = MockProductsService::new();

        products
            .expect_list_products()
            .times(2)
            .returning(|_| Ok(vec![fixtures::product("p1", 10, 5)]));

        let cache = cache(store, MockCategoriesService::new(), products);

        cache.products().await?;
        cache.invalidate_all()?;
        cache.products().await?;

        Ok(())
    }
}
