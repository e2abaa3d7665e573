//! Traffic endpoint.

use crate::error::ApiResult;
use crate::metrics::record_traffic_report;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use bastion_traffic::{TrafficReport, fetch_traffic};
use time::OffsetDateTime;

/// GET /api/monitor/traffic
pub async fn traffic(State(state): State<AppState>) -> ApiResult<Json<TrafficReport>> {
    let api = state.analytics_api()?;
    let report = fetch_traffic(api.as_ref(), OffsetDateTime::now_utc()).await?;
    record_traffic_report(report.granularity);
    Ok(Json(report))
}
