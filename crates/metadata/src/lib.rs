//! Database access and health snapshot persistence for Bastion.
//!
//! This crate provides:
//! - Row-count probes and stored procedure calls (`Database`)
//! - The append-only health snapshot repository (`SnapshotRepo`)
//! - Backends: PostgREST, SQLite (snapshots only), in-memory (snapshots only)

pub mod error;
pub mod models;
pub mod postgrest;
pub mod repos;
pub mod sqlite;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use models::{NewSnapshot, SnapshotRow};
pub use postgrest::PostgrestStore;
pub use repos::{ProcedureRepo, SnapshotRepo, TableRepo};
pub use sqlite::SqliteSnapshotStore;
pub use store::{Database, MemorySnapshotStore};

use bastion_core::config::{BackendConfig, SnapshotStoreConfig};
use std::sync::Arc;

/// Create the database client from configuration.
///
/// Returns `Ok(None)` when backend credentials are not configured.
pub fn database_from_config(config: &BackendConfig) -> MetadataResult<Option<Arc<dyn Database>>> {
    match config.credentials() {
        Some(creds) => {
            let store = PostgrestStore::new(&creds.url, &creds.service_key)?;
            Ok(Some(Arc::new(store) as Arc<dyn Database>))
        }
        None => Ok(None),
    }
}

/// Create the snapshot store from configuration.
///
/// The `backend` store needs backend credentials and yields `Ok(None)`
/// without them; the `sqlite` store is always available.
pub async fn snapshots_from_config(
    store: &SnapshotStoreConfig,
    backend: &BackendConfig,
) -> MetadataResult<Option<Arc<dyn SnapshotRepo>>> {
    match store {
        SnapshotStoreConfig::Backend { table } => match backend.credentials() {
            Some(creds) => {
                let store = PostgrestStore::new(&creds.url, &creds.service_key)?
                    .with_snapshot_table(table.clone());
                Ok(Some(Arc::new(store) as Arc<dyn SnapshotRepo>))
            }
            None => Ok(None),
        },
        SnapshotStoreConfig::Sqlite { path } => {
            let store = SqliteSnapshotStore::new(path).await?;
            Ok(Some(Arc::new(store) as Arc<dyn SnapshotRepo>))
        }
    }
}
