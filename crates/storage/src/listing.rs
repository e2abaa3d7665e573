//! Recursive bucket listing.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ListOptions, ObjectStore};
use futures::future::BoxFuture;

/// Join a directory prefix and an entry name.
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Collect every object path under `prefix`, descending into folders.
///
/// Pages through each directory with an offset cursor until a short or empty
/// page. Paths come back in the backend's listing order. Any listing error
/// aborts the whole walk and names the prefix that failed.
pub async fn list_all_objects(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    page_size: usize,
) -> StorageResult<Vec<String>> {
    if page_size == 0 {
        return Err(StorageError::Config(
            "listing page size must be greater than zero".to_string(),
        ));
    }
    walk(store, bucket, prefix.to_string(), page_size).await
}

fn walk<'a>(
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    prefix: String,
    page_size: usize,
) -> BoxFuture<'a, StorageResult<Vec<String>>> {
    Box::pin(async move {
        let mut files = Vec::new();
        let mut offset = 0;

        loop {
            let options = ListOptions::new(page_size).with_offset(offset);
            let entries = store
                .list(bucket, &prefix, &options)
                .await
                .map_err(|e| StorageError::ListFailed {
                    prefix: prefix.clone(),
                    message: e.upstream_message(),
                })?;

            if entries.is_empty() {
                break;
            }

            let page_len = entries.len();
            for entry in entries {
                let path = join_path(&prefix, &entry.name);
                if entry.is_file() {
                    files.push(path);
                } else {
                    // Nested failures already carry their own prefix.
                    files.extend(walk(store, bucket, path, page_size).await?);
                }
            }

            if page_len < page_size {
                break;
            }
            offset += page_size;
        }

        tracing::debug!(
            bucket = bucket,
            prefix = %prefix,
            files = files.len(),
            "Listed storage prefix"
        );
        Ok(files)
    })
}
