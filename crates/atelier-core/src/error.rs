//! Error types for the atelier media backend.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using atelier's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for media pipeline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Upload exceeds the configured size limit
    #[error("File too large: {size} bytes (maximum {max})")]
    FileTooLarge { size: usize, max: usize },

    /// Declared MIME type or file extension is not in the allow-list
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Image or video encode step errored
    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    /// Object-store put failed for a variant or the original
    #[error("Storage upload failed: {0}")]
    StorageUploadFailed(String),

    /// Delete blocked by a non-zero reference count
    #[error("Asset is in use by {ref_count} content entities")]
    AssetInUse { ref_count: i32 },

    /// Media asset not found in the catalog
    #[error("Asset not found: {0}")]
    AssetNotFound(Uuid),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
