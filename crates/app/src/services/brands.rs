//! Brands service.

use async_trait::async_trait;
use mockall::automock;
use till::catalog::{Brand, BrandId};

use crate::{
    backend::{BackendClient, ListQuery},
    services::{errors::ServiceError, models::NewBrand},
};

/// Brands backed by the `/brands` endpoints.
#[derive(Debug, Clone)]
pub struct HttpBrandsService {
    client: BackendClient,
}

impl HttpBrandsService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BrandsService for HttpBrandsService {
    async fn list_brands(&self, query: ListQuery) -> Result<Vec<Brand>, ServiceError> {
        Ok(self.client.get("brands", &query.pairs()).await?)
    }

    async fn create_brand(&self, brand: NewBrand) -> Result<(), ServiceError> {
        Ok(self.client.post("brands", &brand).await?)
    }

    async fn update_brand(&self, brand: Brand) -> Result<(), ServiceError> {
        Ok(self
            .client
            .put(&format!("brands/{}", brand.id), &brand)
            .await?)
    }

    async fn delete_brand(&self, id: BrandId) -> Result<(), ServiceError> {
        Ok(self.client.delete(&format!("brands/{id}")).await?)
    }
}

#[automock]
#[async_trait]
pub trait BrandsService: Send + Sync {
    /// Retrieve a page of brands.
    async fn list_brands(&self, query: ListQuery) -> Result<Vec<Brand>, ServiceError>;

    /// Create a brand.
    async fn create_brand(&self, brand: NewBrand) -> Result<(), ServiceError>;

    /// Replace a brand.
    async fn update_brand(&self, brand: Brand) -> Result<(), ServiceError>;

    /// Delete a brand.
    async fn delete_brand(&self, id: BrandId) -> Result<(), ServiceError>;
}
