use async_trait::async_trait;
use bastion_storage::error::{StorageError, StorageResult};
use bastion_storage::traits::{ListOptions, ObjectEntry, ObjectStore};
use bastion_storage::MemoryObjectStore;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Wraps the memory backend, recording calls and injecting failures.
#[allow(dead_code)]
pub struct InstrumentedStore {
    pub inner: MemoryObjectStore,
    pub list_calls: AtomicUsize,
    pub remove_batches: Mutex<Vec<usize>>,
    /// Listing this prefix fails with the given message.
    pub fail_list_at: Option<(String, String)>,
    /// The remove call with this zero-based index fails.
    pub fail_remove_at: Option<usize>,
    /// Report deletions as unconfirmed (`None`).
    pub unconfirmed_removes: bool,
}

#[allow(dead_code)]
impl InstrumentedStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryObjectStore::new(),
            list_calls: AtomicUsize::new(0),
            remove_batches: Mutex::new(Vec::new()),
            fail_list_at: None,
            fail_remove_at: None,
            unconfirmed_removes: false,
        }
    }

    pub async fn with_objects(bucket: &str, paths: &[String]) -> Self {
        let store = Self::new();
        store.inner.create_bucket(bucket).await;
        for path in paths {
            store.inner.insert(bucket, path).await;
        }
        store
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn remove_batches(&self) -> Vec<usize> {
        self.remove_batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for InstrumentedStore {
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> StorageResult<Vec<ObjectEntry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((fail_prefix, message)) = &self.fail_list_at {
            if fail_prefix == prefix {
                return Err(StorageError::Api {
                    status: 500,
                    message: message.clone(),
                });
            }
        }
        self.inner.list(bucket, prefix, options).await
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<Option<Vec<String>>> {
        let index = {
            let mut batches = self.remove_batches.lock().unwrap();
            batches.push(paths.len());
            batches.len() - 1
        };
        if self.fail_remove_at == Some(index) {
            return Err(StorageError::Api {
                status: 403,
                message: "new row violates row-level security policy".to_string(),
            });
        }
        let removed = self.inner.remove(bucket, paths).await?;
        if self.unconfirmed_removes {
            Ok(None)
        } else {
            Ok(removed)
        }
    }

    fn backend_name(&self) -> &'static str {
        "instrumented"
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// `count` flat file paths under `dir`.
#[allow(dead_code)]
pub fn flat_paths(dir: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            if dir.is_empty() {
                format!("file-{i:05}.jpg")
            } else {
                format!("{dir}/file-{i:05}.jpg")
            }
        })
        .collect()
}
