//! Storage and database wipe.
//!
//! The steps run strictly in order: enumerate every object in the bucket,
//! delete them in batches, then call the truncation procedure. A storage
//! failure stops the run before the procedure is called. Deletions already
//! made are not rolled back.

use crate::metrics::{WIPE_FILES_DELETED, WIPE_RUNS};
use bastion_core::config::AdminConfig;
use bastion_metadata::Database;
use bastion_storage::{ObjectStore, StorageError, list_all_objects, remove_in_batches};
use serde::Serialize;

/// Storage half of a wipe report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub bucket: String,
    pub listed_files: u64,
    pub deleted_files: u64,
}

/// Database half of a wipe report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DbSummary {
    pub truncated: bool,
}

/// Wipe response body for completed and partially completed runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WipeResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub storage: StorageSummary,
    pub db: DbSummary,
}

/// Result of a wipe whose storage half succeeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WipeOutcome {
    Completed(StorageSummary),
    /// Storage was emptied but the truncation procedure failed.
    DatabaseFailed {
        storage: StorageSummary,
        message: String,
    },
}

impl WipeOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn into_response_body(self) -> WipeResponse {
        match self {
            Self::Completed(storage) => WipeResponse {
                ok: true,
                error: None,
                storage,
                db: DbSummary { truncated: true },
            },
            Self::DatabaseFailed { storage, message } => WipeResponse {
                ok: false,
                error: Some(format!("Database wipe failed: {message}")),
                storage,
                db: DbSummary { truncated: false },
            },
        }
    }
}

/// Empty the configured bucket, then truncate the database tables.
///
/// Returns `Err` only when the storage half fails; a failed procedure call
/// is reported as [`WipeOutcome::DatabaseFailed`].
pub async fn run_wipe(
    storage: &dyn ObjectStore,
    database: &dyn Database,
    admin: &AdminConfig,
) -> Result<WipeOutcome, StorageError> {
    let bucket = admin.bucket.as_str();
    tracing::warn!(bucket, procedure = %admin.procedure, "Starting wipe");

    let storage_result = async {
        let paths = list_all_objects(storage, bucket, "", admin.list_page_size).await?;
        tracing::info!(bucket, files = paths.len(), "Listed objects for wipe");
        let deleted = remove_in_batches(storage, bucket, &paths, admin.remove_batch_size).await?;
        Ok::<_, StorageError>((paths.len() as u64, deleted))
    }
    .await;

    let (listed, deleted) = match storage_result {
        Ok(counts) => counts,
        Err(e) => {
            if let StorageError::RemoveFailed { removed_before, .. } = &e {
                WIPE_FILES_DELETED.inc_by(*removed_before);
            }
            WIPE_RUNS.with_label_values(&["failed"]).inc();
            tracing::error!(bucket, error = %e, "Wipe aborted before database truncation");
            return Err(e);
        }
    };
    WIPE_FILES_DELETED.inc_by(deleted);

    let summary = StorageSummary {
        bucket: bucket.to_string(),
        listed_files: listed,
        deleted_files: deleted,
    };

    match database.call_procedure(&admin.procedure).await {
        Ok(()) => {
            WIPE_RUNS.with_label_values(&["completed"]).inc();
            tracing::warn!(bucket, deleted, "Wipe completed");
            Ok(WipeOutcome::Completed(summary))
        }
        Err(e) => {
            WIPE_RUNS.with_label_values(&["partial"]).inc();
            tracing::error!(
                bucket,
                deleted,
                procedure = %admin.procedure,
                error = %e,
                "Storage wiped but database truncation failed"
            );
            Ok(WipeOutcome::DatabaseFailed {
                storage: summary,
                message: e.to_string(),
            })
        }
    }
}
