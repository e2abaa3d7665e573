//! Shared-secret checks and request tracing middleware.

use crate::error::{ApiError, ApiResult};
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use bastion_core::config::{AdminConfig, MetricsConfig};
use sha2::{Digest, Sha256};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the wipe secret.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Header carrying the metrics refresh secret.
pub const METRICS_TOKEN_HEADER: &str = "x-metrics-token";

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    /// Truncated to MAX_TRACE_ID_LEN characters; anything but printable ASCII is dropped.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.trim().is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Attach a trace ID to the request and run it inside a span carrying it.
pub async fn trace_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(&req);
    let span = tracing::info_span!("request", trace_id = %trace_id);
    req.extensions_mut().insert(trace_id);
    next.run(req).instrument(span).await
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Compare a caller-supplied secret with the configured one by digest.
pub fn secrets_match(provided: Option<&str>, expected: &str) -> bool {
    provided.is_some_and(|provided| digest(provided) == digest(expected))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Require the wipe secret.
///
/// Without a configured secret every caller is rejected.
pub fn require_wipe_token(headers: &HeaderMap, admin: &AdminConfig) -> ApiResult<()> {
    let authorized = admin
        .wipe_token()
        .is_some_and(|expected| secrets_match(header_value(headers, ADMIN_TOKEN_HEADER), expected));
    if authorized {
        Ok(())
    } else {
        tracing::warn!("Rejected wipe request with missing or invalid token");
        Err(ApiError::Unauthorized("Unauthorized".to_string()))
    }
}

/// Require the metrics refresh secret when one is configured.
///
/// The header wins over the `token` query parameter when both are present.
pub fn require_metrics_token(
    headers: &HeaderMap,
    query_token: Option<&str>,
    metrics: &MetricsConfig,
) -> ApiResult<()> {
    let Some(expected) = metrics.refresh_token() else {
        return Ok(());
    };
    let provided = header_value(headers, METRICS_TOKEN_HEADER).or(query_token);
    if secrets_match(provided, expected) {
        Ok(())
    } else {
        tracing::warn!("Rejected metrics refresh with missing or invalid token");
        Err(ApiError::Unauthorized("Unauthorized.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn trace_id_is_sanitized() {
        let id = TraceId::from_client("abc\n\u{7f}def");
        assert_eq!(id.as_str(), "abcdef");

        let long = "x".repeat(500);
        assert_eq!(TraceId::from_client(&long).as_str().len(), MAX_TRACE_ID_LEN);

        let generated = TraceId::from_client("\n\n");
        assert!(Uuid::parse_str(generated.as_str()).is_ok());
    }

    #[test]
    fn wipe_token_must_match() {
        let admin = AdminConfig {
            wipe_token: Some("s3cret".to_string()),
            ..Default::default()
        };
        assert!(require_wipe_token(&headers(ADMIN_TOKEN_HEADER, "s3cret"), &admin).is_ok());
        assert!(require_wipe_token(&headers(ADMIN_TOKEN_HEADER, "s3cre"), &admin).is_err());
        assert!(require_wipe_token(&HeaderMap::new(), &admin).is_err());
    }

    #[test]
    fn wipe_rejected_without_configured_token() {
        let admin = AdminConfig {
            wipe_token: Some(String::new()),
            ..Default::default()
        };
        assert!(require_wipe_token(&headers(ADMIN_TOKEN_HEADER, ""), &admin).is_err());
    }

    #[test]
    fn metrics_token_only_checked_when_configured() {
        let open = MetricsConfig::default();
        assert!(require_metrics_token(&HeaderMap::new(), None, &open).is_ok());

        let gated = MetricsConfig {
            refresh_token: Some("m-token".to_string()),
            ..Default::default()
        };
        assert!(require_metrics_token(&HeaderMap::new(), None, &gated).is_err());
        assert!(require_metrics_token(&HeaderMap::new(), Some("m-token"), &gated).is_ok());
        assert!(
            require_metrics_token(&headers(METRICS_TOKEN_HEADER, "m-token"), None, &gated).is_ok()
        );
        // A wrong header is not rescued by a correct query parameter.
        assert!(
            require_metrics_token(
                &headers(METRICS_TOKEN_HEADER, "wrong"),
                Some("m-token"),
                &gated
            )
            .is_err()
        );
    }
}
