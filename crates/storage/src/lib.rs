//! Object storage abstraction and backends for Bastion.
//!
//! This crate provides:
//! - A bucket-oriented `ObjectStore` trait with paged directory listings
//! - Recursive enumeration of every object under a prefix
//! - Batched deletion
//! - Backends: Supabase Storage REST API and in-memory

pub mod backends;
pub mod error;
pub mod listing;
pub mod removal;
pub mod traits;

pub use backends::{memory::MemoryObjectStore, supabase::SupabaseStorage};
pub use error::{StorageError, StorageResult};
pub use listing::list_all_objects;
pub use removal::remove_in_batches;
pub use traits::{
    DEFAULT_PAGE_SIZE, DEFAULT_REMOVE_BATCH_SIZE, ListOptions, ObjectEntry, ObjectStore, SortBy,
    SortOrder,
};

use bastion_core::config::BackendConfig;
use std::sync::Arc;

/// Create an object store from configuration.
///
/// Returns `Ok(None)` when backend credentials are not configured.
pub fn from_config(config: &BackendConfig) -> StorageResult<Option<Arc<dyn ObjectStore>>> {
    match config.credentials() {
        Some(creds) => {
            let backend = SupabaseStorage::new(&creds.url, &creds.service_key)?;
            Ok(Some(Arc::new(backend)))
        }
        None => Ok(None),
    }
}
