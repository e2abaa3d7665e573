//! Health probe results and aggregated snapshots.

use crate::config::ProbeTarget;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// What a probe inspected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// A database table, probed with a count-only query.
    Table,
    /// A storage bucket, probed with a bounded listing.
    Storage,
}

impl ModuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Error,
}

/// Result of probing one table or bucket.
///
/// `count` is set for tables and `file_count` for buckets; `error` only when
/// the probe failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStatus {
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub name: String,
    pub label: String,
    pub category: String,
    pub status: ProbeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u64>,
    /// Probe latency in milliseconds.
    pub latency: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModuleStatus {
    /// A successful probe. `value` is a row count for tables and a file count
    /// for buckets.
    pub fn ok(kind: ModuleKind, target: &ProbeTarget, value: u64, latency_ms: u64) -> Self {
        let (count, file_count) = match kind {
            ModuleKind::Table => (Some(value), None),
            ModuleKind::Storage => (None, Some(value)),
        };
        Self {
            kind,
            name: target.name.clone(),
            label: target.label.clone(),
            category: target.category.clone(),
            status: ProbeStatus::Ok,
            count,
            file_count,
            latency: latency_ms,
            error: None,
        }
    }

    /// A failed probe carrying the upstream message.
    pub fn failed(
        kind: ModuleKind,
        target: &ProbeTarget,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            kind,
            name: target.name.clone(),
            label: target.label.clone(),
            category: target.category.clone(),
            status: ProbeStatus::Error,
            count: None,
            file_count: None,
            latency: latency_ms,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ProbeStatus::Error
    }
}

/// Overall system status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
        }
    }

    /// Parse a stored status string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "healthy" => Some(Self::Healthy),
            "degraded" => Some(Self::Degraded),
            _ => None,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One aggregated health check.
///
/// `status` is `Degraded` exactly when some module failed; construct through
/// [`HealthSnapshot::from_modules`] to keep that true.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Wall-clock latency of the whole check in milliseconds.
    pub latency: u64,
    pub modules: Vec<ModuleStatus>,
}

impl HealthSnapshot {
    pub fn from_modules(
        modules: Vec<ModuleStatus>,
        timestamp: OffsetDateTime,
        latency_ms: u64,
    ) -> Self {
        Self {
            status: status_for(&modules),
            timestamp,
            latency: latency_ms,
            modules,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == HealthStatus::Degraded
    }

    /// Number of modules whose probe failed.
    pub fn failed_modules(&self) -> usize {
        self.modules.iter().filter(|m| m.is_error()).count()
    }
}

/// Degraded iff any module errored.
pub fn status_for(modules: &[ModuleStatus]) -> HealthStatus {
    if modules.iter().any(ModuleStatus::is_error) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
