//! Traffic query error types.

use serde_json::Value;
use thiserror::Error;

/// Traffic query errors.
#[derive(Debug, Error)]
pub enum TrafficError {
    /// Credentials absent; raised before any network call.
    #[error("Missing Cloudflare environment variables.")]
    MissingConfig { required: Vec<&'static str> },

    /// The analytics API rejected the query. `details` echoes its errors.
    #[error("Cloudflare API error.")]
    Upstream { status: u16, details: Value },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for traffic queries.
pub type TrafficResult<T> = std::result::Result<T, TrafficError>;
