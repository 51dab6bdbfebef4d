//! Unified error handling for Snipbox

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
///
/// The first three variants are expected domain outcomes that handlers
/// intercept and turn into form errors or 404 pages; the remaining ones
/// are internal faults that surface to the client as a generic 500 with
/// the detail kept server-side.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("no matching record found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("session store call timed out")]
    SessionStoreTimeout,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session store error: {0}")]
    SessionStore(#[from] redis::RedisError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            // Handlers normally intercept these before they reach here
            AppError::InvalidCredentials | AppError::DuplicateEmail => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::SessionStoreTimeout => {
                tracing::error!("session store call exceeded its timeout");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::SessionStore(e) => {
                tracing::error!("session store error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Generic body only; internal detail never leaks to the client
        let body = status.canonical_reason().unwrap_or("Error").to_string();
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::NotFound;
        assert_eq!(err.to_string(), "no matching record found");
    }

    #[test]
    fn test_error_conversion() {
        let err: AppError = anyhow::anyhow!("something went wrong").into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_internal_fault_maps_to_500() {
        let err: AppError = anyhow::anyhow!("boom").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
