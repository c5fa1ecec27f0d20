//! Common error types for the geo-resolver workspace

use thiserror::Error;

/// Common result type for storage and configuration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the store, registry and config layers
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored or supplied JSON could not be encoded/decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (e.g. a malformed table schema)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
