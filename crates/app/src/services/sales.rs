//! Sales service.

use async_trait::async_trait;
use mockall::automock;
use till::sales::{SaleId, SaleRecord};

use crate::{
    backend::{BackendClient, ListQuery},
    services::errors::ServiceError,
};

/// Sales backed by the `/sales` endpoints.
#[derive(Debug, Clone)]
pub struct HttpSalesService {
    client: BackendClient,
}

impl HttpSalesService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SalesService for HttpSalesService {
    async fn list_sales(&self, query: ListQuery) -> Result<Vec<SaleRecord>, ServiceError> {
        Ok(self.client.get("sales", &query.pairs()).await?)
    }

    async fn create_sale(&self, sale: SaleRecord) -> Result<(), ServiceError> {
        Ok(self.client.post("sales", &sale).await?)
    }

    async fn cancel_sale(&self, id: SaleId) -> Result<(), ServiceError> {
        Ok(self.client.patch(&format!("sales/{id}/cancel")).await?)
    }
}

#[automock]
#[async_trait]
pub trait SalesService: Send + Sync {
    /// Retrieve a page of sales.
    async fn list_sales(&self, query: ListQuery) -> Result<Vec<SaleRecord>, ServiceError>;

    /// Record a completed sale. Called exactly once per sale.
    async fn create_sale(&self, sale: SaleRecord) -> Result<(), ServiceError>;

    /// Flag a sale as cancelled.
    async fn cancel_sale(&self, id: SaleId) -> Result<(), ServiceError>;
}
