//! App Context

use std::{path::PathBuf, sync::Arc};

use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::warn;

use crate::{
    backend::{BackendClient, BackendError},
    catalog::CatalogCache,
    checkout::{BackgroundTasks, Checkout, SaleCanceller, StockOutbox, StockReconciler},
    config::{ConfigError, TillConfig},
    services::{
        BrandsService, CategoriesService, HttpBrandsService, HttpCategoriesService,
        HttpProductsService, HttpSalesService, HttpUsersService, ProductsService, SalesService,
        UsersService,
    },
    session::SessionManager,
    storage::{LocalStore, StoreError},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build backend client")]
    Backend(#[source] BackendError),

    #[error("failed to open local store")]
    Store(#[source] StoreError),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub categories: Arc<dyn CategoriesService>,
    pub brands: Arc<dyn BrandsService>,
    pub users: Arc<dyn UsersService>,
    pub sales: Arc<dyn SalesService>,
    pub store: LocalStore,
    pub catalog: CatalogCache,
    pub reconciler: StockReconciler,
    pub checkout: Checkout,
    pub canceller: SaleCanceller,
    pub tasks: BackgroundTasks,
    pub currency: &'static Currency,
    pub receipts_dir: PathBuf,
}

impl AppContext {
    /// Build application context from configuration and start retrying any
    /// stock adjustments a previous run left queued. Must be called from
    /// within the tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when the currency is unknown, the HTTP client cannot
    /// be built or the local store cannot be opened.
    pub fn init(config: &TillConfig) -> Result<Self, AppInitError> {
        let currency = config.currency()?;
        let client = BackendClient::new(&config.backend).map_err(AppInitError::Backend)?;
        let store = LocalStore::open(&config.storage.data_dir).map_err(AppInitError::Store)?;

        let products: Arc<dyn ProductsService> =
            Arc::new(HttpProductsService::new(client.clone()));
        let categories: Arc<dyn CategoriesService> =
            Arc::new(HttpCategoriesService::new(client.clone()));
        let brands: Arc<dyn BrandsService> = Arc::new(HttpBrandsService::new(client.clone()));
        let users: Arc<dyn UsersService> = Arc::new(HttpUsersService::new(client.clone()));
        let sales: Arc<dyn SalesService> = Arc::new(HttpSalesService::new(client));

        let catalog = CatalogCache::new(
            store.clone(),
            Arc::clone(&categories),
            Arc::clone(&brands),
            Arc::clone(&products),
        );

        let reconciler =
            StockReconciler::new(Arc::clone(&products), StockOutbox::new(store.clone()));
        let tasks = BackgroundTasks::default();
        let receipts_dir = config.storage.receipts_dir.clone();

        let checkout = Checkout::new(
            Arc::clone(&products),
            Arc::clone(&sales),
            reconciler.clone(),
            tasks.clone(),
            receipts_dir.clone(),
            currency,
        );

        let canceller = SaleCanceller::new(Arc::clone(&sales), reconciler.clone());

        let retry = reconciler.clone();

        tasks.spawn(async move {
            if let Err(error) = retry.retry_pending().await {
                warn!(%error, "failed to read queued stock adjustments");
            }
        });

        Ok(Self {
            products,
            categories,
            brands,
            users,
            sales,
            store,
            catalog,
            reconciler,
            checkout,
            canceller,
            tasks,
            currency,
            receipts_dir,
        })
    }

    /// Load the persisted session.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the stored session cannot be read.
    pub fn session(&self) -> Result<SessionManager, StoreError> {
        SessionManager::restore(self.store.clone())
    }

    /// Wait for background work, such as stock deductions, to finish.
    pub async fn shutdown(&self) {
        self.tasks.wait().await;
    }
}
