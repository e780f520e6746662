//! Products service.

use async_trait::async_trait;
use mockall::automock;
use till::catalog::{Product, ProductId};

use crate::{
    backend::{BackendClient, ListQuery},
    services::{errors::ServiceError, models::NewProduct},
};

/// Products backed by the `/products` endpoints.
#[derive(Debug, Clone)]
pub struct HttpProductsService {
    client: BackendClient,
}

impl HttpProductsService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProductsService for HttpProductsService {
    async fn list_products(&self, query: ListQuery) -> Result<Vec<Product>, ServiceError> {
        Ok(self.client.get("products", &query.pairs()).await?)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, ServiceError> {
        Ok(self.client.get(&format!("products/{id}"), &[]).await?)
    }

    async fn create_product(&self, product: NewProduct) -> Result<(), ServiceError> {
        Ok(self.client.post("products", &product).await?)
    }

    async fn update_product(&self, product: Product) -> Result<(), ServiceError> {
        Ok(self
            .client
            .put(&format!("products/{}", product.id), &product)
            .await?)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), ServiceError> {
        Ok(self.client.delete(&format!("products/{id}")).await?)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieve a page of products.
    async fn list_products(&self, query: ListQuery) -> Result<Vec<Product>, ServiceError>;

    /// Retrieve a single product with its live stock.
    async fn get_product(&self, id: ProductId) -> Result<Product, ServiceError>;

    /// Create a product.
    async fn create_product(&self, product: NewProduct) -> Result<(), ServiceError>;

    /// Replace a product, including its stock levels.
    async fn update_product(&self, product: Product) -> Result<(), ServiceError>;

    /// Delete a product.
    async fn delete_product(&self, id: ProductId) -> Result<(), ServiceError>;
}
