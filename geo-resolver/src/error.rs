//! Error types for geo-resolver
//!
//! `GeocodeError` is what the core returns; `ApiError` is what HTTP handlers
//! turn into responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::provider::ResolutionMiss;

/// Errors raised along the resolution and replication paths
///
/// Resolution-path kinds (`ResolutionMiss`, `CacheReadCorruption`,
/// `CachePersistence`) are handled inside a batch and never abort it.
/// `TableCreation` and `Store` abort the replication step only.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Provider gave no usable result
    #[error("No geocoding result: {0}")]
    ResolutionMiss(#[from] ResolutionMiss),

    /// Cached payload could not be read back as a cache entry
    #[error("Corrupt cache entry {key}: {reason}")]
    CacheReadCorruption { key: String, reason: String },

    /// Writing a resolved entry to the cache failed
    #[error("Failed to persist cache entry {key}: {source}")]
    CachePersistence {
        key: String,
        #[source]
        source: geo_common::Error,
    },

    /// The project's local geo table could not be created
    #[error("Failed to create local geo table for project {project_id}: {source}")]
    TableCreation {
        project_id: i64,
        #[source]
        source: geo_common::Error,
    },

    /// Item store or table registry failure outside the cases above
    #[error("Store error: {0}")]
    Store(#[from] geo_common::Error),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Geocoding or replication failure (500)
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// Storage failure outside the geocoding core (500)
    #[error("Common error: {0}")]
    Common(#[from] geo_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Geocode(ref err) => {
                let code = match err {
                    GeocodeError::TableCreation { .. } => "TABLE_CREATION_FAILED",
                    GeocodeError::CachePersistence { .. } => "CACHE_PERSISTENCE_FAILED",
                    GeocodeError::CacheReadCorruption { .. } => "CACHE_CORRUPT",
                    GeocodeError::ResolutionMiss(_) => "RESOLUTION_MISS",
                    GeocodeError::Store(_) => "STORE_ERROR",
                    GeocodeError::HttpClient(_) => "HTTP_CLIENT_ERROR",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
