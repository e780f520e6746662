//! Categories service.

use async_trait::async_trait;
use mockall::automock;
use till::catalog::{Category, CategoryId};

use crate::{
    backend::{BackendClient, ListQuery},
    services::{errors::ServiceError, models::NewCategory},
};

/// Categories backed by the `/categories` endpoints.
#[derive(Debug, Clone)]
pub struct HttpCategoriesService {
    client: BackendClient,
}

impl HttpCategoriesService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CategoriesService for HttpCategoriesService {
    async fn list_categories(&self, query: ListQuery) -> Result<Vec<Category>, ServiceError> {
        Ok(self.client.get("categories", &query.pairs()).await?)
    }

    async fn create_category(&self, category: NewCategory) -> Result<(), ServiceError> {
        Ok(self.client.post("categories", &category).await?)
    }

    async fn update_category(&self, category: Category) -> Result<(), ServiceError> {
        Ok(self
            .client
            .put(&format!("categories/{}", category.id), &category)
            .await?)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), ServiceError> {
        Ok(self.client.delete(&format!("categories/{id}")).await?)
    }
}

#[automock]
#[async_trait]
pub trait CategoriesService: Send + Sync {
    /// Retrieve a page of categories.
    async fn list_categories(&self, query: ListQuery) -> Result<Vec<Category>, ServiceError>;

    /// Create a category.
    async fn create_category(&self, category: NewCategory) -> Result<(), ServiceError>;

    /// Replace a category.
    async fn update_category(&self, category: Category) -> Result<(), ServiceError>;

    /// Delete a category.
    async fn delete_category(&self, id: CategoryId) -> Result<(), ServiceError>;
}
