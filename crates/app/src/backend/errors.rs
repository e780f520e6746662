//! Backend errors

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,

        /// The body's `message` field when present, otherwise the raw body.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl BackendError {
    /// Build a [`BackendError::Status`] from a failed response.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map_or_else(|_| body.trim().to_string(), |parsed| parsed.message);

        BackendError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_prefers_json_message_field() {
        let error = BackendError::from_response(
            StatusCode::CONFLICT,
            r#"{"message":"Sale already cancelled","code":17}"#,
        );

        assert_eq!(
            error.to_string(),
            "backend returned status 409: Sale already cancelled"
        );
    }

    #[test]
    fn status_message_falls_back_to_raw_body() {
        let error = BackendError::from_response(StatusCode::BAD_GATEWAY, "upstream down\n");

        assert!(matches!(
            error,
            BackendError::Status { status: 502, ref message } if message == "upstream down"
        ));
    }
}
