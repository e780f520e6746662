//! Service errors

use thiserror::Error;

use crate::backend::{BackendError, is_not_found};

/// Errors returned by backend services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The addressed record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other backend failure.
    #[error(transparent)]
    Backend(BackendError),
}

impl From<BackendError> for ServiceError {
    fn from(error: BackendError) -> Self {
        if is_not_found(&error) {
            return ServiceError::NotFound(error.to_string());
        }

        ServiceError::Backend(error)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn not_found_status_maps_to_not_found() {
        let error = ServiceError::from(BackendError::from_response(
            StatusCode::NOT_FOUND,
            r#"{"message":"Producto no encontrado"}"#,
        ));

        assert!(matches!(
            error,
            ServiceError::NotFound(ref message) if message.contains("Producto no encontrado")
        ));
    }

    #[test]
    fn other_statuses_stay_backend_errors() {
        let error = ServiceError::from(BackendError::from_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "",
        ));

        assert!(matches!(error, ServiceError::Backend(_)));
    }
}
