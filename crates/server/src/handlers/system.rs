//! System health and metrics snapshot endpoints.

use crate::auth::require_metrics_token;
use crate::error::{ApiError, ApiResult};
use crate::health::aggregate;
use crate::snapshots::{latest_snapshot, refresh_snapshot};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use bastion_core::HealthSnapshot;
use serde::Deserialize;
use time::OffsetDateTime;

/// Query parameters accepted by the refresh endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    pub token: Option<String>,
}

/// GET /api/system/health
///
/// Probes every configured table and bucket. Probe failures are reported per
/// module and never fail the request.
pub async fn system_health(State(state): State<AppState>) -> ApiResult<Json<HealthSnapshot>> {
    let (storage, database) = state.backend()?;
    let snapshot = aggregate(&state.config.probes, storage.as_ref(), database.as_ref()).await;
    Ok(Json(snapshot))
}

/// GET|POST /api/system/metrics/refresh
///
/// Serves the latest stored snapshot while it is younger than the minimum
/// refresh interval; otherwise probes, stores, and returns a new one.
pub async fn refresh_metrics(
    State(state): State<AppState>,
    Query(query): Query<RefreshQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<HealthSnapshot>> {
    let (storage, database) = state.backend()?;
    let repo = state.snapshot_repo()?;
    require_metrics_token(&headers, query.token.as_deref(), &state.config.metrics)?;

    let (snapshot, source) = refresh_snapshot(
        repo.as_ref(),
        state.config.metrics.min_refresh_interval(),
        OffsetDateTime::now_utc(),
        aggregate(&state.config.probes, storage.as_ref(), database.as_ref()),
    )
    .await?;
    tracing::debug!(source = source.as_str(), "Metrics snapshot served");
    Ok(Json(snapshot))
}

/// GET /api/system/metrics
///
/// Latest stored snapshot, or 404 `{"status": "empty"}` before the first one.
pub async fn latest_metrics(State(state): State<AppState>) -> ApiResult<Json<HealthSnapshot>> {
    let repo = state.snapshot_repo()?;
    latest_snapshot(repo.as_ref())
        .await?
        .map(Json)
        .ok_or(ApiError::Empty)
}
