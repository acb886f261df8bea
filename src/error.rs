//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for key generation and every cache provider.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not present in the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key present but past its TTL
    #[error("Key expired: {0}")]
    Expired(String),

    /// Every key of a batch read missed
    #[error("No results for any requested key")]
    NoResults,

    /// Operation called without the arguments it needs
    #[error("Empty input for {0}")]
    EmptyInput(&'static str),

    /// Capability not implemented by this backend
    #[error("Not implemented by this provider: {0}")]
    Unsupported(&'static str),

    /// Canonical form could not be serialized
    #[error("Encoding failure: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No Tokio runtime to host background work
    #[error("Runtime unavailable: {0}")]
    Runtime(String),

    /// Backend could not be configured
    #[cfg(feature = "redis")]
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Redis command failed
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis connection pool failed
    #[cfg(feature = "redis")]
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}

impl CacheError {
    /// True for the conditions a caller should answer by recomputing.
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            CacheError::NotFound(_) | CacheError::Expired(_) | CacheError::NoResults
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) | CacheError::Expired(_) | CacheError::NoResults => {
                StatusCode::NOT_FOUND
            }
            CacheError::EmptyInput(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;
