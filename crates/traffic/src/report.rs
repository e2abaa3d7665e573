//! Traffic window report with minute-to-hour fallback.

use crate::client::AnalyticsApi;
use crate::error::{TrafficError, TrafficResult};
use crate::fallback::is_field_access_denied;
use crate::query::{build_request, parse_series};
use bastion_core::{Granularity, TrafficPoint, TrafficRates, TrafficSummary, TrafficTotals};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Series and derived rates over the trailing window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficReport {
    /// Always `"ok"`.
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub window_minutes: u64,
    /// Which query answered.
    pub granularity: Granularity,
    pub series: Vec<TrafficPoint>,
    pub totals: TrafficTotals,
    pub rates: TrafficRates,
}

impl TrafficReport {
    pub fn new(granularity: Granularity, series: Vec<TrafficPoint>, generated_at: OffsetDateTime) -> Self {
        let summary = TrafficSummary::from_points(&series, granularity.window_secs());
        Self {
            status: "ok".to_string(),
            generated_at,
            window_minutes: granularity.window_minutes(),
            granularity,
            series,
            totals: summary.totals,
            rates: summary.rates,
        }
    }
}

/// Query the window ending at `now`, preferring per-minute buckets.
///
/// Falls back once to per-hour buckets when the per-minute query is refused
/// for authorization on its field. Any other upstream error is returned
/// as is, and so is a failed fallback.
pub async fn fetch_traffic(api: &dyn AnalyticsApi, now: OffsetDateTime) -> TrafficResult<TrafficReport> {
    let primary = Granularity::Minute;
    let response = api
        .query(&build_request(primary, api.zone_id(), now)?)
        .await?;

    if !response.is_failure() {
        let series = parse_series(&response.body, primary)?;
        return Ok(TrafficReport::new(primary, series, now));
    }

    if !is_field_access_denied(&response.body, primary) {
        tracing::warn!(status = response.status, "Analytics query failed");
        return Err(response.into_error());
    }

    let fallback = Granularity::Hour;
    tracing::info!(
        from = %primary,
        to = %fallback,
        "Per-minute analytics not authorized, retrying hourly"
    );
    let response = api
        .query(&build_request(fallback, api.zone_id(), now)?)
        .await?;
    if response.is_failure() {
        tracing::warn!(status = response.status, "Hourly analytics query failed");
        return Err(response.into_error());
    }

    let series = parse_series(&response.body, fallback)?;
    Ok(TrafficReport::new(fallback, series, now))
}

/// Settings needed before any query is made.
pub fn missing_config() -> TrafficError {
    TrafficError::MissingConfig {
        required: bastion_core::config::TrafficConfig::REQUIRED_ENV.to_vec(),
    }
}
