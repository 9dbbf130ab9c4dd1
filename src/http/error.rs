//! Request-level errors and their HTTP mapping.
//!
//! Every error is converted into a status code plus a plain-text body at
//! the handler boundary; none of them affect other requests or the store.

use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caller supplied missing or unusable input.
    #[error("{0}")]
    Validation(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The mapping table could not be encoded as JSON.
    #[error("Error retrieving mappings")]
    Serialization(#[source] serde_json::Error),

    /// A stored destination cannot be sent as a `Location` header.
    #[error("Invalid redirect destination for {path}")]
    InvalidDestination { path: String },

    #[error(transparent)]
    Form(#[from] FormRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Serialization(_) | ApiError::InvalidDestination { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Form(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        match self {
            ApiError::Form(rejection) => rejection.into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::InvalidDestination { path: "/x".into() }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ApiError::Serialization(json_err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_response_carries_message() {
        let response = ApiError::Validation("Path and URL are required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
