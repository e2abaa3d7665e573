//! Application state shared across handlers.

use crate::error::{ApiError, ApiResult};
use bastion_core::config::AppConfig;
use bastion_metadata::{Database, SnapshotRepo};
use bastion_storage::ObjectStore;
use bastion_traffic::AnalyticsApi;
use std::sync::Arc;

/// Shared application state.
///
/// Every backend is optional: missing credentials leave the slot empty and
/// the endpoints that need it answer with a configuration error.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Option<Arc<dyn ObjectStore>>,
    pub database: Option<Arc<dyn Database>>,
    pub snapshots: Option<Arc<dyn SnapshotRepo>>,
    pub analytics: Option<Arc<dyn AnalyticsApi>>,
}

impl AppState {
    /// Create state with no backends attached.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            storage: None,
            database: None,
            snapshots: None,
            analytics: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn ObjectStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotRepo>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsApi>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// Storage and database clients, or a configuration error.
    pub fn backend(&self) -> ApiResult<(Arc<dyn ObjectStore>, Arc<dyn Database>)> {
        match (&self.storage, &self.database) {
            (Some(storage), Some(database)) => Ok((storage.clone(), database.clone())),
            _ => Err(ApiError::backend_missing()),
        }
    }

    /// Snapshot repository, or a configuration error.
    pub fn snapshot_repo(&self) -> ApiResult<Arc<dyn SnapshotRepo>> {
        self.snapshots.clone().ok_or_else(ApiError::backend_missing)
    }

    /// Analytics client, or the missing-settings error.
    pub fn analytics_api(&self) -> ApiResult<Arc<dyn AnalyticsApi>> {
        self.analytics
            .clone()
            .ok_or_else(|| ApiError::Traffic(bastion_traffic::missing_config()))
    }
}
