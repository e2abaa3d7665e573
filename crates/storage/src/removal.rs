//! Batched object deletion.

use crate::error::{StorageError, StorageResult};
use crate::traits::ObjectStore;

/// Delete `paths` in consecutive batches of at most `batch_size`.
///
/// Batches run strictly one after another. The returned count adds up the
/// paths each call confirms, falling back to the batch length when the
/// backend does not report them. The first failing batch stops the run;
/// batches already sent stay deleted.
pub async fn remove_in_batches(
    store: &dyn ObjectStore,
    bucket: &str,
    paths: &[String],
    batch_size: usize,
) -> StorageResult<u64> {
    if batch_size == 0 {
        return Err(StorageError::Config(
            "remove batch size must be greater than zero".to_string(),
        ));
    }

    let mut removed = 0u64;
    for (index, batch) in paths.chunks(batch_size).enumerate() {
        let confirmed = store
            .remove(bucket, batch)
            .await
            .map_err(|e| StorageError::RemoveFailed {
                message: e.upstream_message(),
                removed_before: removed,
            })?;

        let count = match confirmed {
            Some(deleted) => deleted.len(),
            None => batch.len(),
        };
        removed += count as u64;

        tracing::debug!(
            bucket = bucket,
            batch = index,
            requested = batch.len(),
            confirmed = count,
            "Removed storage batch"
        );
    }

    Ok(removed)
}
