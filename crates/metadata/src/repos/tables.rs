//! Table repository.

use crate::error::MetadataResult;
use async_trait::async_trait;

/// Repository for table-level reads.
#[async_trait]
pub trait TableRepo: Send + Sync {
    /// Exact row count of a table without fetching rows.
    async fn count_rows(&self, table: &str) -> MetadataResult<u64>;
}
