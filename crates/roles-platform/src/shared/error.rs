//! Platform Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{entity_type} with id {id} not found")]
    NotFound { entity_type: String, id: String },

    #[error("{entity_type} with {field} '{value}' already exists")]
    Conflict { entity_type: String, field: String, value: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn conflict(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Conflict {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::StorageUnavailable { .. } => "STORAGE_UNAVAILABLE",
        }
    }
}

impl From<StoreError> for PlatformError {
    fn from(err: StoreError) -> Self {
        Self::storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Error response body
#[derive(Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Storage details stay in the logs
        let message = match &self {
            Self::StorageUnavailable { message } => {
                error!(%message, "Request failed on storage");
                "The role store is temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PlatformError::not_found("Role", "1").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(PlatformError::conflict("Role", "name", "admin").status_code(), StatusCode::CONFLICT);
        assert_eq!(PlatformError::invalid_input("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PlatformError::storage("down").status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            PlatformError::conflict("Role", "name", "admin").to_string(),
            "Role with name 'admin' already exists"
        );
        assert_eq!(PlatformError::not_found("Role", "42").to_string(), "Role with id 42 not found");
    }

    #[test]
    fn test_store_errors_become_storage_unavailable() {
        let err: PlatformError = StoreError::transient("scan", "throttled").into();
        assert!(matches!(err, PlatformError::StorageUnavailable { .. }));
    }
}
