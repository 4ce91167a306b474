//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lesson_tracker_core::ServiceError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A typed failure from the Auth Gate or the Item Service.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    /// Status code and client-facing message. Storage and internal details never leave the server.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Service(ServiceError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password".to_string())
            }
            ApiError::Service(ServiceError::Unauthenticated) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            ApiError::Service(ServiceError::Forbidden) => {
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }
            ApiError::Service(ServiceError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Service(ServiceError::InvalidInput(reason)) => {
                (StatusCode::BAD_REQUEST, format!("Invalid input: {}", reason))
            }
            ApiError::Service(ServiceError::Conflict(_)) => {
                (StatusCode::CONFLICT, "Conflict".to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_tracker_core::PortError;

    #[test]
    fn service_errors_map_to_their_status_codes() {
        let cases = [
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (ServiceError::InvalidInput("x".to_string()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn storage_failures_hide_their_detail() {
        let err = ApiError::from(ServiceError::Port(PortError::Unexpected(
            "connection refused on 10.0.0.5".to_string(),
        )));

        let (status, message) = err.status_and_message();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("10.0.0.5"));
    }
}
