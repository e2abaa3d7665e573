//! Call-counting backends with injectable failures.

use async_trait::async_trait;
use bastion_metadata::{
    Database, MetadataError, MetadataResult, ProcedureRepo, TableRepo,
};
use bastion_storage::{
    ListOptions, MemoryObjectStore, ObjectEntry, ObjectStore, StorageError, StorageResult,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Database stub: fixed row counts, failing tables, and a recorded procedure.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubDatabase {
    counts: HashMap<String, u64>,
    failing_tables: HashSet<String>,
    procedure_error: Option<String>,
    count_calls: AtomicUsize,
    procedure_calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl StubDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, table: &str, rows: u64) -> Self {
        self.counts.insert(table.to_string(), rows);
        self
    }

    pub fn failing_table(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    pub fn failing_procedure(mut self, message: &str) -> Self {
        self.procedure_error = Some(message.to_string());
        self
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn procedure_calls(&self) -> Vec<String> {
        self.procedure_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableRepo for StubDatabase {
    async fn count_rows(&self, table: &str) -> MetadataResult<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_tables.contains(table) {
            return Err(MetadataError::Api {
                status: 404,
                message: format!("relation \"public.{table}\" does not exist"),
            });
        }
        Ok(self.counts.get(table).copied().unwrap_or(0))
    }
}

#[async_trait]
impl ProcedureRepo for StubDatabase {
    async fn call_procedure(&self, name: &str) -> MetadataResult<()> {
        self.procedure_calls.lock().unwrap().push(name.to_string());
        match &self.procedure_error {
            Some(message) => Err(MetadataError::Api {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Database for StubDatabase {
    async fn health_check(&self) -> MetadataResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "stub"
    }
}

/// Memory object store that records calls and fails on demand.
#[allow(dead_code)]
pub struct StubStore {
    pub inner: MemoryObjectStore,
    failing_buckets: HashSet<String>,
    fail_remove: bool,
    list_calls: AtomicUsize,
    remove_batches: Mutex<Vec<usize>>,
}

#[allow(dead_code)]
impl StubStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryObjectStore::new(),
            failing_buckets: HashSet::new(),
            fail_remove: false,
            list_calls: AtomicUsize::new(0),
            remove_batches: Mutex::new(Vec::new()),
        }
    }

    /// Create `bucket` holding `paths`.
    pub async fn with_objects(self, bucket: &str, paths: &[String]) -> Self {
        self.inner.create_bucket(bucket).await;
        for path in paths {
            self.inner.insert(bucket, path).await;
        }
        self
    }

    /// Every listing of `bucket` fails.
    pub fn failing_bucket(mut self, bucket: &str) -> Self {
        self.failing_buckets.insert(bucket.to_string());
        self
    }

    /// Every remove call fails.
    pub fn failing_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn remove_batches(&self) -> Vec<usize> {
        self.remove_batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for StubStore {
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> StorageResult<Vec<ObjectEntry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_buckets.contains(bucket) {
            return Err(StorageError::Api {
                status: 400,
                message: "The resource was not found".to_string(),
            });
        }
        self.inner.list(bucket, prefix, options).await
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<Option<Vec<String>>> {
        self.remove_batches.lock().unwrap().push(paths.len());
        if self.fail_remove {
            return Err(StorageError::Api {
                status: 500,
                message: "remove rejected".to_string(),
            });
        }
        self.inner.remove(bucket, paths).await
    }

    fn backend_name(&self) -> &'static str {
        "stub"
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.inner.health_check().await
    }
}

/// `count` flat file paths under `dir`.
#[allow(dead_code)]
pub fn flat_paths(dir: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{dir}/file-{i:04}.pdf")).collect()
}
