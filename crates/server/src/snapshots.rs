//! Stored snapshot reuse.

use crate::metrics::{SNAPSHOT_CACHE_HITS, SNAPSHOT_REFRESHES};
use bastion_core::HealthSnapshot;
use bastion_metadata::{MetadataResult, NewSnapshot, SnapshotRepo};
use std::future::Future;
use std::time::Duration;
use time::OffsetDateTime;

/// Where a refreshed snapshot came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotSource {
    /// The latest stored row was young enough to reuse.
    Cached,
    /// A new snapshot was computed and appended.
    Computed,
}

impl SnapshotSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Computed => "computed",
        }
    }
}

/// Return the latest stored snapshot if it is younger than `min_interval`,
/// otherwise run `compute`, append the result, and return the stored row.
///
/// Reused rows are returned unchanged, so two calls inside the interval see
/// the same timestamp.
pub async fn refresh_snapshot<F>(
    repo: &dyn SnapshotRepo,
    min_interval: Duration,
    now: OffsetDateTime,
    compute: F,
) -> MetadataResult<(HealthSnapshot, SnapshotSource)>
where
    F: Future<Output = HealthSnapshot>,
{
    if let Some(latest) = repo.latest_snapshot().await?
        && latest.age(now) < min_interval
    {
        SNAPSHOT_CACHE_HITS.inc();
        tracing::debug!(
            id = latest.id,
            store = repo.store_name(),
            "Serving stored snapshot"
        );
        return Ok((latest.to_snapshot(), SnapshotSource::Cached));
    }

    let snapshot = compute.await;
    let row = repo.insert_snapshot(&NewSnapshot::from(&snapshot)).await?;
    SNAPSHOT_REFRESHES.inc();
    tracing::info!(
        id = row.id,
        store = repo.store_name(),
        status = %row.status,
        "Stored new snapshot"
    );
    Ok((row.to_snapshot(), SnapshotSource::Computed))
}

/// Latest stored snapshot without probing.
pub async fn latest_snapshot(repo: &dyn SnapshotRepo) -> MetadataResult<Option<HealthSnapshot>> {
    Ok(repo.latest_snapshot().await?.map(|row| row.to_snapshot()))
}
