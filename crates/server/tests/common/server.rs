//! Server test utilities.

use super::stubs::{StubDatabase, StubStore};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bastion_core::config::AppConfig;
use bastion_metadata::MemorySnapshotStore;
use bastion_server::{AppState, create_router};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Router plus handles on its stub backends.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub storage: Arc<StubStore>,
    pub database: Arc<StubDatabase>,
    pub snapshots: Arc<MemorySnapshotStore>,
}

#[allow(dead_code)]
impl TestServer {
    /// Test configuration with the given stubs and an in-memory snapshot store.
    pub fn new(config: AppConfig, storage: StubStore, database: StubDatabase) -> Self {
        let storage = Arc::new(storage);
        let database = Arc::new(database);
        let snapshots = Arc::new(MemorySnapshotStore::new());
        let state = AppState::new(config)
            .with_storage(storage.clone())
            .with_database(database.clone())
            .with_snapshots(snapshots.clone());
        let router = create_router(state.clone());
        Self {
            router,
            state,
            storage,
            database,
            snapshots,
        }
    }

    /// Server with no backends attached.
    pub fn unconfigured(config: AppConfig) -> axum::Router {
        create_router(AppState::new(config))
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        send(&self.router, method, uri, headers).await
    }
}

/// Send one request and decode the JSON body (`Null` when empty or not JSON).
#[allow(dead_code)]
pub async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
