//! Health snapshot repository.

use crate::error::MetadataResult;
use crate::models::{NewSnapshot, SnapshotRow};
use async_trait::async_trait;

/// Append-only store of health snapshots.
#[async_trait]
pub trait SnapshotRepo: Send + Sync {
    /// Most recent snapshot by creation time, if any.
    async fn latest_snapshot(&self) -> MetadataResult<Option<SnapshotRow>>;

    /// Append a snapshot and return the stored row.
    async fn insert_snapshot(&self, snapshot: &NewSnapshot) -> MetadataResult<SnapshotRow>;

    /// Name of the backing store, for logs.
    fn store_name(&self) -> &'static str;

    /// Verify the snapshot table can be reached.
    async fn check_store(&self) -> MetadataResult<()>;
}
