//! Prometheus metrics for the Bastion server.
//!
//! Covers wipe runs, health probes, snapshot caching, and traffic queries.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! It exposes probe latencies and wipe counts but no table contents.
//! Restrict it to the scraper's network at the infrastructure level.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use bastion_core::Granularity;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Wipe metrics
pub static WIPE_RUNS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("bastion_wipe_runs_total", "Wipe runs by outcome"),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static WIPE_FILES_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "bastion_wipe_files_deleted_total",
        "Storage objects deleted by wipe runs",
    )
    .expect("metric creation failed")
});

// Health probe metrics
pub static PROBE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bastion_probe_duration_seconds",
            "Health probe duration by module kind",
        )
        .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["kind"],
    )
    .expect("metric creation failed")
});

pub static PROBE_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("bastion_probe_failures_total", "Failed health probes by module kind"),
        &["kind"],
    )
    .expect("metric creation failed")
});

// Snapshot cache metrics
pub static SNAPSHOT_CACHE_HITS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "bastion_snapshot_cache_hits_total",
        "Refresh requests answered from a stored snapshot",
    )
    .expect("metric creation failed")
});

pub static SNAPSHOT_REFRESHES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "bastion_snapshot_refreshes_total",
        "Snapshots recomputed and stored",
    )
    .expect("metric creation failed")
});

// Traffic metrics
pub static TRAFFIC_QUERIES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bastion_traffic_queries_total",
            "Traffic reports served by answering granularity",
        ),
        &["granularity"],
    )
    .expect("metric creation failed")
});

pub static TRAFFIC_FALLBACKS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "bastion_traffic_fallbacks_total",
        "Traffic reports answered by the hourly fallback",
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent; calls after the first are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(WIPE_RUNS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(WIPE_FILES_DELETED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PROBE_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PROBE_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SNAPSHOT_CACHE_HITS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SNAPSHOT_REFRESHES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TRAFFIC_QUERIES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TRAFFIC_FALLBACKS.clone()))
            .expect("metric registration failed");
    });
}

/// Handler for the /metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record the outcome of a traffic report.
pub fn record_traffic_report(granularity: Granularity) {
    TRAFFIC_QUERIES
        .with_label_values(&[granularity.as_str()])
        .inc();
    if granularity == Granularity::Hour {
        TRAFFIC_FALLBACKS.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        register_metrics();
        register_metrics();
    }

    #[test]
    fn hourly_reports_count_as_fallbacks() {
        let before = TRAFFIC_FALLBACKS.get();
        record_traffic_report(Granularity::Minute);
        record_traffic_report(Granularity::Hour);
        assert!(TRAFFIC_FALLBACKS.get() >= before + 1);
    }
}
