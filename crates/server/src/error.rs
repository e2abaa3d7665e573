//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bastion_traffic::TrafficError;
use serde::Serialize;
use serde_json::{Value, json};

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: &'static str,
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub error: String,
    /// Raw upstream detail, when there is any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Settings that must be provided before the request can succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<&'static str>>,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Nothing has been stored yet.
    #[error("no snapshot stored yet")]
    Empty,

    #[error(transparent)]
    Storage(#[from] bastion_storage::StorageError),

    #[error(transparent)]
    Metadata(#[from] bastion_metadata::MetadataError),

    #[error(transparent)]
    Traffic(#[from] TrafficError),
}

impl ApiError {
    /// Backend URL or service key is absent.
    pub fn backend_missing() -> Self {
        Self::Config("Supabase environment variables are missing.".to_string())
    }

    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::Empty => "empty",
            Self::Storage(_) => "storage_error",
            Self::Metadata(_) => "database_error",
            Self::Traffic(e) => match e {
                TrafficError::MissingConfig { .. } => "configuration_error",
                TrafficError::Upstream { .. } => "upstream_error",
                _ => "traffic_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Empty => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Traffic(e) => match e {
                TrafficError::Upstream { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::Traffic(TrafficError::Upstream { details, .. }) => Some(details.clone()),
            _ => None,
        }
    }

    fn required(&self) -> Option<Vec<&'static str>> {
        match self {
            Self::Traffic(TrafficError::MissingConfig { required }) => Some(required.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if matches!(self, Self::Empty) {
            return (status, Json(json!({ "status": "empty" }))).into_response();
        }
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }
        let body = ErrorResponse {
            status: "error",
            code: self.code().to_string(),
            error: self.to_string(),
            details: self.details(),
            required: self.required(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
