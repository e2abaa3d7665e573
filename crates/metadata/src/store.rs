//! Database trait and the in-memory snapshot store.

use crate::error::MetadataResult;
use crate::models::{NewSnapshot, SnapshotRow};
use crate::repos::{ProcedureRepo, SnapshotRepo, TableRepo};
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// Combined database trait used by the wipe and health flows.
#[async_trait]
pub trait Database: TableRepo + ProcedureRepo + Send + Sync {
    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;

    /// Get the name of this database backend.
    fn backend_name(&self) -> &'static str;
}

/// Snapshot store kept in process memory.
///
/// Rows are lost on restart. Used for tests and when no persistent store is
/// reachable.
#[derive(Default)]
pub struct MemorySnapshotStore {
    rows: Mutex<Vec<SnapshotRow>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully formed row, keeping its `id` and `created_at`.
    pub async fn seed(&self, row: SnapshotRow) {
        self.rows.lock().await.push(row);
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl SnapshotRepo for MemorySnapshotStore {
    async fn latest_snapshot(&self) -> MetadataResult<Option<SnapshotRow>> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().max_by_key(|row| (row.created_at, row.id)).cloned())
    }

    async fn insert_snapshot(&self, snapshot: &NewSnapshot) -> MetadataResult<SnapshotRow> {
        let mut rows = self.rows.lock().await;
        let id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;
        let row = SnapshotRow {
            id,
            created_at: OffsetDateTime::now_utc(),
            status: snapshot.status,
            latency_ms: snapshot.latency_ms,
            modules: snapshot.modules.clone(),
        };
        rows.push(row.clone());
        Ok(row)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn check_store(&self) -> MetadataResult<()> {
        Ok(())
    }
}
