//! Edge traffic analytics for Bastion.
//!
//! Queries request, byte and cache counters for a trailing window and reduces
//! them to per-bucket rates and window totals. Per-minute data is preferred;
//! zones whose plan does not expose it are answered from hourly data.

pub mod client;
pub mod error;
pub mod fallback;
pub mod query;
pub mod report;

pub use client::{AnalyticsApi, CloudflareClient, UpstreamResponse};
pub use error::{TrafficError, TrafficResult};
pub use fallback::is_field_access_denied;
pub use query::{GraphqlRequest, build_request, parse_series};
pub use report::{TrafficReport, fetch_traffic, missing_config};
