use crate::schema::{FieldError, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Longest store error text echoed back to a client
pub const MAX_ERROR_MESSAGE_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection to {database} failed: {cause}")]
    ConnectionFailed { database: String, cause: String },

    #[error("Query on collection {collection} failed: {cause}")]
    QueryFailed { collection: String, cause: String },

    #[error("Invalid collection name: {name}")]
    InvalidCollection { name: String },

    #[error("Document for {collection} is not a JSON object")]
    NotAnObject { collection: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Stored {kind} document {id} does not match its schema: {source}")]
    CorruptDocument {
        kind: &'static str,
        id: String,
        source: ValidationError,
    },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "validation_failed".to_string(),
                    message: err.to_string(),
                    fields: Some(err.fields.clone()),
                },
            ),
            ApiError::Storage(err) => {
                error!("Storage error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "storage_error".to_string(),
                        message: truncate_chars(&err.to_string(), MAX_ERROR_MESSAGE_CHARS),
                        fields: None,
                    },
                )
            }
            ApiError::CorruptDocument { .. } => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "storage_error".to_string(),
                        message: truncate_chars(&self.to_string(), MAX_ERROR_MESSAGE_CHARS),
                        fields: None,
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        StorageError::Internal(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for StorageError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StorageError::Unavailable(format!("Pool error: {}", err))
    }
}

/// Cuts `text` to at most `max` characters, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ñandú", 2), "ña");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_validation_maps_to_422() {
        let err = ApiError::from(ValidationError::single("email", "missing", "field required"));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_storage_maps_to_500() {
        let err = ApiError::from(StorageError::Unavailable("x".repeat(500)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
