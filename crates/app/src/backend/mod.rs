//! Backend HTTP client.
//!
//! Thin JSON client over the POS backend's REST surface. Every non-2xx
//! response becomes [`BackendError::Status`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::config::BackendConfig;

mod errors;
mod query;

pub use errors::BackendError;
pub use query::{ListQuery, Order, UNBOUNDED_LIMIT};

/// HTTP client for the POS backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();

        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            http: builder.build()?,
        })
    }

    /// Base URL requests are made against, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET` `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status or a body that
    /// does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let response = self
            .send(self.http.get(self.url(path)).query(query))
            .await?;

        Ok(response.json().await?)
    }

    /// `POST` a JSON body to `path`, discarding the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        self.send(self.http.post(self.url(path)).json(body))
            .await
            .map(drop)
    }

    /// `PUT` a JSON body to `path`, discarding the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        self.send(self.http.put(self.url(path)).json(body))
            .await
            .map(drop)
    }

    /// `PATCH` `path` without a body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn patch(&self, path: &str) -> Result<(), BackendError> {
        self.send(self.http.patch(self.url(path))).await.map(drop)
    }

    /// `DELETE` `path`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn delete(&self, path: &str) -> Result<(), BackendError> {
        self.send(self.http.delete(self.url(path))).await.map(drop)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        debug!(url = %response.url(), %status, "backend response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        Err(BackendError::from_response(status, &body))
    }
}

/// Returns true if the backend reported the addressed record as missing.
pub(crate) fn is_not_found(error: &BackendError) -> bool {
    matches!(
        error,
        BackendError::Status { status, .. } if *status == StatusCode::NOT_FOUND.as_u16()
    )
}
