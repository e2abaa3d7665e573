//! Analytics API client.

use crate::error::{TrafficError, TrafficResult};
use crate::query::GraphqlRequest;
use async_trait::async_trait;
use bastion_core::config::{TrafficConfig, TrafficCredentials};
use reqwest::Url;
use serde_json::Value;
use tracing::instrument;

/// Raw answer from the analytics API.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Parsed JSON body, or the raw text as a JSON string when not JSON.
    pub body: Value,
}

impl UpstreamResponse {
    /// Non-2xx status or a non-empty `errors` member.
    pub fn is_failure(&self) -> bool {
        let has_errors = match self.body.get("errors") {
            None | Some(Value::Null) => false,
            Some(Value::Array(errors)) => !errors.is_empty(),
            Some(_) => true,
        };
        !(200..300).contains(&self.status) || has_errors
    }

    /// Error detail to echo to the caller: the `errors` member, else the body.
    pub fn error_details(&self) -> Value {
        match self.body.get("errors") {
            Some(errors) if !errors.is_null() => errors.clone(),
            _ => self.body.clone(),
        }
    }

    pub fn into_error(self) -> TrafficError {
        TrafficError::Upstream {
            status: self.status,
            details: self.error_details(),
        }
    }
}

/// Analytics GraphQL endpoint bound to one zone.
#[async_trait]
pub trait AnalyticsApi: Send + Sync + 'static {
    /// Zone the queries are scoped to.
    fn zone_id(&self) -> &str;

    /// Send one GraphQL request.
    ///
    /// Non-success statuses are returned as responses; only transport
    /// failures are errors.
    async fn query(&self, request: &GraphqlRequest) -> TrafficResult<UpstreamResponse>;
}

/// Cloudflare GraphQL analytics client.
#[derive(Clone)]
pub struct CloudflareClient {
    http: reqwest::Client,
    endpoint: Url,
    api_token: String,
    zone_id: String,
}

impl CloudflareClient {
    pub fn new(endpoint: &str, credentials: TrafficCredentials) -> TrafficResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| TrafficError::InvalidResponse(format!("invalid endpoint: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            api_token: credentials.api_token,
            zone_id: credentials.zone_id,
        })
    }

    /// Build a client, or report which settings are missing.
    pub fn from_config(config: &TrafficConfig) -> TrafficResult<Self> {
        let credentials = config.credentials().ok_or_else(crate::report::missing_config)?;
        Self::new(&config.endpoint, credentials)
    }
}

#[async_trait]
impl AnalyticsApi for CloudflareClient {
    fn zone_id(&self) -> &str {
        &self.zone_id
    }

    #[instrument(skip(self, request))]
    async fn query(&self, request: &GraphqlRequest) -> TrafficResult<UpstreamResponse> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) if (200..300).contains(&status) => {
                return Err(TrafficError::InvalidResponse(format!("analytics body: {e}")));
            }
            Err(_) => Value::String(text),
        };
        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_detection() {
        let ok = UpstreamResponse {
            status: 200,
            body: json!({"data": {}, "errors": null}),
        };
        assert!(!ok.is_failure());

        let gql_error = UpstreamResponse {
            status: 200,
            body: json!({"data": null, "errors": [{"message": "x"}]}),
        };
        assert!(gql_error.is_failure());
        assert_eq!(gql_error.error_details(), json!([{"message": "x"}]));

        let http_error = UpstreamResponse {
            status: 403,
            body: json!({"success": false}),
        };
        assert!(http_error.is_failure());
        assert_eq!(http_error.error_details(), json!({"success": false}));
    }

    #[test]
    fn from_config_reports_required_settings() {
        let config = TrafficConfig::default();
        match CloudflareClient::from_config(&config) {
            Err(TrafficError::MissingConfig { required }) => {
                assert_eq!(required, vec!["CLOUDFLARE_API_TOKEN", "CLOUDFLARE_ZONE_ID"]);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected missing config"),
        }
    }
}
