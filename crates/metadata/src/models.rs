//! Persisted health snapshot records.

use bastion_core::{HealthSnapshot, HealthStatus, ModuleStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A snapshot about to be appended. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSnapshot {
    pub status: HealthStatus,
    pub latency_ms: u64,
    pub modules: Vec<ModuleStatus>,
}

impl From<&HealthSnapshot> for NewSnapshot {
    fn from(snapshot: &HealthSnapshot) -> Self {
        Self {
            status: snapshot.status,
            latency_ms: snapshot.latency,
            modules: snapshot.modules.clone(),
        }
    }
}

/// One stored snapshot row. Rows are never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub modules: Vec<ModuleStatus>,
}

impl SnapshotRow {
    /// Age relative to `now`; negative ages (clock skew) count as zero.
    pub fn age(&self, now: OffsetDateTime) -> std::time::Duration {
        std::time::Duration::try_from(now - self.created_at).unwrap_or(std::time::Duration::ZERO)
    }

    /// The dashboard view of this row; `created_at` becomes the timestamp.
    pub fn to_snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: self.status,
            timestamp: self.created_at,
            latency: self.latency_ms,
            modules: self.modules.clone(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ModuleStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ModuleStatus>>::deserialize(deserializer)?.unwrap_or_default())
}
