//! Route configuration.

use crate::auth::trace_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Liveness (no backend access, for load balancers)
        .route("/v1/health", get(handlers::liveness))
        // Destructive admin operation
        .route("/api/admin/wipe", post(handlers::wipe))
        // System health and stored snapshots
        .route("/api/system/health", get(handlers::system_health))
        .route(
            "/api/system/metrics/refresh",
            get(handlers::refresh_metrics).post(handlers::refresh_metrics),
        )
        .route("/api/system/metrics", get(handlers::latest_metrics))
        // Edge traffic
        .route("/api/monitor/traffic", get(handlers::traffic));

    let mut router = Router::new().merge(api_routes);

    // Keep /metrics off public networks; see crate::metrics.
    if state.config.server.metrics_enabled {
        router = router.merge(Router::new().route("/metrics", get(metrics_handler)));
    }

    router
        .layer(middleware::from_fn(trace_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
