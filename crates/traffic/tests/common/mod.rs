use async_trait::async_trait;
use bastion_traffic::{AnalyticsApi, GraphqlRequest, TrafficResult, UpstreamResponse};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Replays canned responses in order and records every request.
#[allow(dead_code)]
pub struct ScriptedAnalytics {
    responses: Mutex<Vec<UpstreamResponse>>,
    pub requests: Mutex<Vec<GraphqlRequest>>,
}

#[allow(dead_code)]
impl ScriptedAnalytics {
    pub fn new(responses: Vec<UpstreamResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn queried_fields(&self) -> Vec<&'static str> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| {
                if r.query.contains("httpRequests1mGroups") {
                    "minute"
                } else {
                    "hour"
                }
            })
            .collect()
    }
}

#[async_trait]
impl AnalyticsApi for ScriptedAnalytics {
    fn zone_id(&self) -> &str {
        "zone-test"
    }

    async fn query(&self, request: &GraphqlRequest) -> TrafficResult<UpstreamResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        assert!(!responses.is_empty(), "unexpected analytics call");
        Ok(responses.remove(0))
    }
}

#[allow(dead_code)]
pub fn ok(body: Value) -> UpstreamResponse {
    UpstreamResponse { status: 200, body }
}

#[allow(dead_code)]
pub fn groups(field: &str, counters: &[(u64, u64, u64)]) -> Value {
    let groups: Vec<Value> = counters
        .iter()
        .enumerate()
        .map(|(i, (requests, bytes, cached))| {
            json!({
                "dimensions": { "datetime": format!("2026-03-01T11:{:02}:00Z", 30 + i) },
                "sum": {
                    "requests": requests,
                    "bytes": bytes,
                    "cachedRequests": cached,
                    "cachedBytes": 0
                }
            })
        })
        .collect();
    let mut zone = serde_json::Map::new();
    zone.insert(field.to_string(), Value::Array(groups));
    json!({ "data": { "viewer": { "zones": [zone] } }, "errors": null })
}

#[allow(dead_code)]
pub fn authz_denied(field: &str) -> UpstreamResponse {
    UpstreamResponse {
        status: 200,
        body: json!({
            "data": null,
            "errors": [{
                "message": "zone 'zone-test' does not have access to the path",
                "path": ["viewer", "zones", "0", field],
                "extensions": { "code": "authz" }
            }]
        }),
    }
}
