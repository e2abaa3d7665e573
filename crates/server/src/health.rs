//! Health aggregation over the configured tables and buckets.
//!
//! Every probe runs concurrently and is classified on its own; a failing
//! probe never affects its siblings. The snapshot is degraded exactly when
//! at least one probe failed.

use crate::metrics::{PROBE_DURATION, PROBE_FAILURES};
use bastion_core::config::{ProbeConfig, ProbeTarget};
use bastion_core::{HealthSnapshot, ModuleKind, ModuleStatus};
use bastion_metadata::Database;
use bastion_storage::{ListOptions, ObjectStore};
use futures::future::{BoxFuture, join_all};
use std::time::Instant;
use time::OffsetDateTime;

/// One independently classified check.
pub struct Probe<'a> {
    pub kind: ModuleKind,
    pub target: &'a ProbeTarget,
    /// Resolves to the observed count or the upstream error message.
    pub check: BoxFuture<'a, Result<u64, String>>,
}

impl<'a> Probe<'a> {
    pub fn new(
        kind: ModuleKind,
        target: &'a ProbeTarget,
        check: BoxFuture<'a, Result<u64, String>>,
    ) -> Self {
        Self {
            kind,
            target,
            check,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

async fn run_probe(probe: Probe<'_>) -> ModuleStatus {
    let started = Instant::now();
    let result = probe.check.await;
    let latency = elapsed_ms(started);

    PROBE_DURATION
        .with_label_values(&[probe.kind.as_str()])
        .observe(started.elapsed().as_secs_f64());

    match result {
        Ok(value) => ModuleStatus::ok(probe.kind, probe.target, value, latency),
        Err(message) => {
            PROBE_FAILURES.with_label_values(&[probe.kind.as_str()]).inc();
            tracing::warn!(
                kind = probe.kind.as_str(),
                name = %probe.target.name,
                error = %message,
                "Health probe failed"
            );
            ModuleStatus::failed(probe.kind, probe.target, message, latency)
        }
    }
}

/// Run probes concurrently and wait for all of them.
///
/// Results keep the order of `probes`.
pub async fn run_probes(probes: Vec<Probe<'_>>) -> Vec<ModuleStatus> {
    join_all(probes.into_iter().map(run_probe)).await
}

/// Table probes followed by bucket probes, in configuration order.
pub fn probes_for<'a>(
    config: &'a ProbeConfig,
    storage: &'a dyn ObjectStore,
    database: &'a dyn Database,
) -> Vec<Probe<'a>> {
    let list_options = ListOptions::new(config.bucket_list_limit);

    let tables = config.tables.iter().map(move |target| {
        let check: BoxFuture<'a, Result<u64, String>> = Box::pin(async move {
            database
                .count_rows(&target.name)
                .await
                .map_err(|e| e.to_string())
        });
        Probe::new(ModuleKind::Table, target, check)
    });

    let buckets = config.buckets.iter().map(move |target| {
        let options = list_options.clone();
        let check: BoxFuture<'a, Result<u64, String>> = Box::pin(async move {
            storage
                .list(&target.name, "", &options)
                .await
                .map(|entries| entries.len() as u64)
                .map_err(|e| e.to_string())
        });
        Probe::new(ModuleKind::Storage, target, check)
    });

    tables.chain(buckets).collect()
}

/// Probe every configured table and bucket and reduce to one snapshot.
///
/// `fileCount` for a bucket only counts root-level entries up to the
/// configured list limit.
pub async fn aggregate(
    config: &ProbeConfig,
    storage: &dyn ObjectStore,
    database: &dyn Database,
) -> HealthSnapshot {
    let started = Instant::now();
    let modules = run_probes(probes_for(config, storage, database)).await;
    let snapshot = HealthSnapshot::from_modules(
        modules,
        OffsetDateTime::now_utc(),
        elapsed_ms(started),
    );

    tracing::info!(
        status = %snapshot.status,
        modules = snapshot.modules.len(),
        failed = snapshot.failed_modules(),
        latency_ms = snapshot.latency,
        "Health aggregated"
    );
    snapshot
}
