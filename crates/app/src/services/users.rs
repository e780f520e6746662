//! Users service.

use async_trait::async_trait;
use mockall::automock;
use till::catalog::{User, UserId};

use crate::{
    backend::{BackendClient, ListQuery},
    services::{errors::ServiceError, models::NewUser},
};

/// Users backed by the `/users` endpoints.
#[derive(Debug, Clone)]
pub struct HttpUsersService {
    client: BackendClient,
}

impl HttpUsersService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsersService for HttpUsersService {
    async fn list_users(&self, query: ListQuery) -> Result<Vec<User>, ServiceError> {
        Ok(self.client.get("users", &query.pairs()).await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<(), ServiceError> {
        Ok(self.client.post("users", &user).await?)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), ServiceError> {
        Ok(self.client.delete(&format!("users/{id}")).await?)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Retrieve a page of users.
    async fn list_users(&self, query: ListQuery) -> Result<Vec<User>, ServiceError>;

    /// Create a user.
    async fn create_user(&self, user: NewUser) -> Result<(), ServiceError>;

    /// Delete a user.
    async fn delete_user(&self, id: UserId) -> Result<(), ServiceError>;
}
