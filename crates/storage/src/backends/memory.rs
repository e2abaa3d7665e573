//! In-memory object store for tests and local runs.

use crate::error::{StorageError, StorageResult};
use crate::listing::join_path;
use crate::traits::{ListOptions, ObjectEntry, ObjectStore, SortOrder};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

/// Buckets of flat object paths; folders are implied by `/` separators.
#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<BTreeMap<String, BTreeSet<String>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_bucket(&self, bucket: &str) {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
    }

    /// Insert an object, creating the bucket if needed.
    pub async fn insert(&self, bucket: &str, path: &str) {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(path.trim_matches('/').to_string());
    }

    /// All object paths currently in `bucket`.
    pub async fn paths(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> StorageResult<Vec<ObjectEntry>> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;

        let prefix = prefix.trim_matches('/');
        let dir = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}/")
        };

        // name -> is_file
        let mut children: BTreeMap<&str, bool> = BTreeMap::new();
        for path in objects.iter().filter_map(|p| p.strip_prefix(dir.as_str())) {
            match path.split_once('/') {
                Some((folder, _)) => {
                    children.entry(folder).or_insert(false);
                }
                None => {
                    children.insert(path, true);
                }
            }
        }

        let mut entries: Vec<ObjectEntry> = children
            .into_iter()
            .map(|(name, is_file)| {
                if is_file {
                    let mut entry = ObjectEntry::file(name, json!({ "size": 0 }));
                    entry.id = Some(join_path(prefix, name));
                    entry
                } else {
                    ObjectEntry::folder(name)
                }
            })
            .collect();
        if options.sort_by.order == SortOrder::Desc {
            entries.reverse();
        }

        Ok(entries
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<Option<Vec<String>>> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        let removed = paths
            .iter()
            .filter(|path| objects.remove(path.as_str()))
            .cloned()
            .collect();
        Ok(Some(removed))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_direct_children_with_folders() {
        let store = MemoryObjectStore::new();
        store.insert("b", "root.txt").await;
        store.insert("b", "123/ktp.jpg").await;
        store.insert("b", "123/docs/ijazah.pdf").await;

        let root = store.list("b", "", &ListOptions::new(10)).await.unwrap();
        let names: Vec<_> = root.iter().map(|e| (e.name.as_str(), e.is_file())).collect();
        assert_eq!(names, vec![("123", false), ("root.txt", true)]);

        let nested = store.list("b", "123", &ListOptions::new(10)).await.unwrap();
        let names: Vec<_> = nested.iter().map(|e| (e.name.as_str(), e.is_file())).collect();
        assert_eq!(names, vec![("docs", false), ("ktp.jpg", true)]);
    }

    #[tokio::test]
    async fn offset_and_limit_page_through_a_directory() {
        let store = MemoryObjectStore::new();
        for i in 0..5 {
            store.insert("b", &format!("f{i}.txt")).await;
        }
        let page = store
            .list("b", "", &ListOptions::new(2).with_offset(4))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "f4.txt");
    }

    #[tokio::test]
    async fn missing_bucket_is_an_error() {
        let store = MemoryObjectStore::new();
        let err = store.list("nope", "", &ListOptions::new(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::BucketNotFound(_)));
    }

    #[tokio::test]
    async fn remove_reports_only_existing_paths() {
        let store = MemoryObjectStore::new();
        store.insert("b", "a.txt").await;
        let removed = store
            .remove("b", &["a.txt".to_string(), "ghost.txt".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, Some(vec!["a.txt".to_string()]));
        assert!(store.paths("b").await.is_empty());
    }
}
