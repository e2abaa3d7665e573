//! Minute-to-hour fallback and window rate math.

mod common;

use bastion_core::Granularity;
use bastion_traffic::{TrafficError, UpstreamResponse, fetch_traffic};
use common::{ScriptedAnalytics, authz_denied, groups, ok};
use serde_json::json;
use time::macros::datetime;

const NOW: time::OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

#[tokio::test]
async fn minute_query_answers_without_fallback() {
    let api = ScriptedAnalytics::new(vec![ok(groups(
        "httpRequests1mGroups",
        &[(1200, 600_000, 600), (600, 300_000, 300)],
    ))]);

    let report = fetch_traffic(&api, NOW).await.unwrap();

    assert_eq!(api.calls(), 1);
    assert_eq!(report.granularity, Granularity::Minute);
    assert_eq!(report.window_minutes, 30);
    assert_eq!(report.series.len(), 2);
    assert_eq!(report.totals.requests, 1800);
    assert_eq!(report.rates.avg_rps, 1.0);
    assert_eq!(report.rates.cache_hit_percent, 50.0);
    assert_eq!(report.rates.avg_bandwidth_bytes_per_sec, 500);
    assert_eq!(report.rates.peak_rps, 20.0);
}

#[tokio::test]
async fn authz_on_minute_field_retries_hourly_once() {
    let api = ScriptedAnalytics::new(vec![
        authz_denied("httpRequests1mGroups"),
        ok(groups("httpRequests1hGroups", &[(7200, 86_400, 3600)])),
    ]);

    let report = fetch_traffic(&api, NOW).await.unwrap();

    assert_eq!(api.queried_fields(), vec!["minute", "hour"]);
    assert_eq!(report.granularity, Granularity::Hour);
    assert_eq!(report.window_minutes, 1440);
    assert_eq!(report.series[0].rps, 2.0);
    assert_eq!(report.rates.avg_bandwidth_bytes_per_sec, 1);
}

#[tokio::test]
async fn authz_on_minute_field_with_http_failure_still_falls_back() {
    let mut denied = authz_denied("httpRequests1mGroups");
    denied.status = 403;
    let api = ScriptedAnalytics::new(vec![
        denied,
        ok(groups("httpRequests1hGroups", &[])),
    ]);

    let report = fetch_traffic(&api, NOW).await.unwrap();
    assert_eq!(api.calls(), 2);
    assert!(report.series.is_empty());
    assert_eq!(report.rates.peak_rps, 0.0);
}

#[tokio::test]
async fn other_errors_are_not_retried() {
    let api = ScriptedAnalytics::new(vec![UpstreamResponse {
        status: 200,
        body: json!({
            "data": null,
            "errors": [{ "message": "rate limited", "extensions": { "code": "rate_limit" } }]
        }),
    }]);

    let err = fetch_traffic(&api, NOW).await.unwrap_err();

    assert_eq!(api.calls(), 1);
    match err {
        TrafficError::Upstream { status, details } => {
            assert_eq!(status, 200);
            assert_eq!(details[0]["message"], "rate limited");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn authz_on_another_field_is_not_retried() {
    let api = ScriptedAnalytics::new(vec![authz_denied("firewallEventsAdaptive")]);
    let err = fetch_traffic(&api, NOW).await.unwrap_err();
    assert_eq!(api.calls(), 1);
    assert!(matches!(err, TrafficError::Upstream { .. }));
}

#[tokio::test]
async fn plain_http_failure_is_not_retried() {
    let api = ScriptedAnalytics::new(vec![UpstreamResponse {
        status: 502,
        body: json!("Bad Gateway"),
    }]);
    let err = fetch_traffic(&api, NOW).await.unwrap_err();
    assert_eq!(api.calls(), 1);
    match err {
        TrafficError::Upstream { status, details } => {
            assert_eq!(status, 502);
            assert_eq!(details, json!("Bad Gateway"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_fallback_is_final() {
    let api = ScriptedAnalytics::new(vec![
        authz_denied("httpRequests1mGroups"),
        authz_denied("httpRequests1hGroups"),
    ]);

    let err = fetch_traffic(&api, NOW).await.unwrap_err();

    assert_eq!(api.queried_fields(), vec!["minute", "hour"]);
    match err {
        TrafficError::Upstream { details, .. } => {
            assert_eq!(details[0]["path"][3], "httpRequests1hGroups");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn report_serializes_dashboard_shape() {
    let api = ScriptedAnalytics::new(vec![ok(groups("httpRequests1mGroups", &[(60, 10, 0)]))]);
    let report = fetch_traffic(&api, NOW).await.unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["status"], "ok");
    assert_eq!(value["generatedAt"], "2026-03-01T12:00:00Z");
    assert_eq!(value["windowMinutes"], 30);
    assert_eq!(value["granularity"], "minute");
    assert_eq!(value["series"][0]["rps"], 1.0);
    assert!(value["totals"].get("cachedBytes").is_some());
    assert!(value["rates"].get("avgRps").is_some());
}
