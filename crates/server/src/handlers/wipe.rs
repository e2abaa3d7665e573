//! Wipe endpoint.

use crate::auth::require_wipe_token;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::wipe::run_wipe;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// POST /api/admin/wipe
///
/// Token is checked before the backend configuration, and both before any
/// remote call.
pub async fn wipe(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    require_wipe_token(&headers, &state.config.admin)?;
    let (storage, database) = state.backend()?;

    let outcome = run_wipe(storage.as_ref(), database.as_ref(), &state.config.admin).await?;
    let status = if outcome.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(outcome.into_response_body())).into_response())
}
