//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage API answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A recursive listing failed; carries the prefix that could not be listed.
    #[error("storage list failed at \"{}\": {message}", display_prefix(.prefix))]
    ListFailed { prefix: String, message: String },

    /// A batch delete failed. Earlier batches stay deleted.
    #[error("storage remove failed: {message}")]
    RemoveFailed { message: String, removed_before: u64 },
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() { "/" } else { prefix }
}

impl StorageError {
    /// The upstream message without the wrapping context.
    pub fn upstream_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::ListFailed { message, .. } | Self::RemoveFailed { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
