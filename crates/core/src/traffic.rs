//! Traffic time series and derived rates.

use serde::{Deserialize, Serialize};

/// Bucket size of an analytics query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Per-minute buckets over a 30 minute window.
    Minute,
    /// Per-hour buckets over a 24 hour window.
    Hour,
}

impl Granularity {
    /// Seconds covered by one bucket.
    pub fn bucket_secs(self) -> u64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3600,
        }
    }

    /// Length of the trailing window in minutes.
    pub fn window_minutes(self) -> u64 {
        match self {
            Self::Minute => 30,
            Self::Hour => 24 * 60,
        }
    }

    pub fn window_secs(self) -> u64 {
        self.window_minutes() * 60
    }

    /// Maximum buckets requested from the upstream API.
    pub fn max_buckets(self) -> u32 {
        match self {
            Self::Minute => 60,
            Self::Hour => 24,
        }
    }

    /// GraphQL field holding the grouped counters.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Minute => "httpRequests1mGroups",
            Self::Hour => "httpRequests1hGroups",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw counters for one bucket as reported upstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficCounters {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub requests: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub bytes: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cached_requests: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cached_bytes: u64,
}

/// Upstream sums may be `null` for buckets without traffic.
fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

/// One time bucket of counters with its request rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPoint {
    /// Bucket start as reported upstream.
    pub time: Option<String>,
    pub requests: u64,
    pub bytes: u64,
    pub cached_requests: u64,
    pub cached_bytes: u64,
    /// Requests per second over the bucket, two decimals.
    pub rps: f64,
}

impl TrafficPoint {
    pub fn new(time: Option<String>, counters: TrafficCounters, granularity: Granularity) -> Self {
        Self {
            time,
            requests: counters.requests,
            bytes: counters.bytes,
            cached_requests: counters.cached_requests,
            cached_bytes: counters.cached_bytes,
            rps: round_to(
                counters.requests as f64 / granularity.bucket_secs() as f64,
                2,
            ),
        }
    }
}

/// Sums over the whole window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficTotals {
    pub requests: u64,
    pub bytes: u64,
    pub cached_requests: u64,
    pub cached_bytes: u64,
}

/// Rates derived from the totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRates {
    pub avg_rps: f64,
    pub peak_rps: f64,
    pub cache_hit_percent: f64,
    pub avg_bandwidth_bytes_per_sec: u64,
}

/// Totals and rates for a window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub totals: TrafficTotals,
    pub rates: TrafficRates,
}

impl TrafficSummary {
    /// Reduce a series of buckets over a window of `window_secs`.
    pub fn from_points(points: &[TrafficPoint], window_secs: u64) -> Self {
        let totals = points.iter().fold(TrafficTotals::default(), |mut acc, p| {
            acc.requests += p.requests;
            acc.bytes += p.bytes;
            acc.cached_requests += p.cached_requests;
            acc.cached_bytes += p.cached_bytes;
            acc
        });
        Self {
            totals,
            rates: TrafficRates::from_totals(&totals, points, window_secs),
        }
    }
}

impl TrafficRates {
    pub fn from_totals(totals: &TrafficTotals, points: &[TrafficPoint], window_secs: u64) -> Self {
        let window = window_secs.max(1) as f64;

        let avg_rps = if totals.requests > 0 {
            round_to(totals.requests as f64 / window, 2)
        } else {
            0.0
        };
        let peak_rps = points.iter().map(|p| p.rps).fold(0.0, f64::max);
        let cache_hit_percent = if totals.requests > 0 {
            round_to(
                totals.cached_requests as f64 / totals.requests as f64 * 100.0,
                1,
            )
        } else {
            0.0
        };
        let avg_bandwidth_bytes_per_sec = if totals.bytes > 0 {
            (totals.bytes as f64 / window).round() as u64
        } else {
            0
        };

        Self {
            avg_rps,
            peak_rps,
            cache_hit_percent,
            avg_bandwidth_bytes_per_sec,
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
