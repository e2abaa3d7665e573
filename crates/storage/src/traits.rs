//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default entries per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Default paths per delete call.
pub const DEFAULT_REMOVE_BATCH_SIZE: usize = 100;

/// Sort direction for listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort order for listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub column: String,
    pub order: SortOrder,
}

impl Default for SortBy {
    fn default() -> Self {
        Self {
            column: "name".to_string(),
            order: SortOrder::Asc,
        }
    }
}

/// Options for a single listing call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListOptions {
    /// Maximum entries returned.
    pub limit: usize,
    /// Entries to skip from the start of the directory.
    pub offset: usize,
    pub sort_by: SortBy,
}

impl ListOptions {
    /// First page of `limit` entries sorted by name.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            offset: 0,
            sort_by: SortBy::default(),
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// One entry of a directory listing.
///
/// Folders are reported without metadata; files always carry some.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ObjectEntry {
    /// A leaf object.
    pub fn file(name: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            id: None,
            metadata: Some(metadata),
        }
    }

    /// A folder placeholder.
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            metadata: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| !m.is_null())
    }
}

/// Object store abstraction over a bucket-oriented storage API.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// List the direct children of `prefix` in `bucket`.
    ///
    /// An empty prefix lists the bucket root.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> StorageResult<Vec<ObjectEntry>>;

    /// Delete the given object paths in one call.
    ///
    /// Returns the paths the backend confirms deleted, or `None` when it does
    /// not report them.
    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<Option<Vec<String>>>;

    /// Get the name of this storage backend.
    ///
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend answers with the configured credentials.
    async fn health_check(&self) -> StorageResult<()>;
}
