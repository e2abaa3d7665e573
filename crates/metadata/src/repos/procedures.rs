//! Stored procedure repository.

use crate::error::MetadataResult;
use async_trait::async_trait;

/// Repository for remote procedure calls.
#[async_trait]
pub trait ProcedureRepo: Send + Sync {
    /// Invoke a parameterless stored procedure.
    async fn call_procedure(&self, name: &str) -> MetadataResult<()>;
}
