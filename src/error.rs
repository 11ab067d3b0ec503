//! Error types for the storefront backend
//!
//! Two families: `CacheError` for cache-store failures (never surfaced to
//! clients) and `ApiError` for domain failures that map to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Failure of a cache backend operation.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Redis command failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Could not obtain a pooled Redis connection
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key or value rejected by the store
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backend could not be built from configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == API Error Enum ==
/// Client-facing domain error.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for request handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_mapping() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_message_is_bare() {
        let err = ApiError::NotFound("Product Not Found".into());
        assert_eq!(err.to_string(), "Product Not Found");
    }

    #[test]
    fn test_cache_error_from_serde() {
        let err: CacheError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
