//! SQLite-backed snapshot store for local and single-node deployments.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{NewSnapshot, SnapshotRow};
use crate::repos::SnapshotRepo;
use async_trait::async_trait;
use bastion_core::HealthStatus;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// SQLite-based snapshot store.
pub struct SqliteSnapshotStore {
    pool: Pool<Sqlite>,
}

#[derive(FromRow)]
struct SnapshotRecord {
    id: i64,
    created_at: OffsetDateTime,
    status: String,
    latency_ms: i64,
    modules: String,
}

impl TryFrom<SnapshotRecord> for SnapshotRow {
    type Error = MetadataError;

    fn try_from(record: SnapshotRecord) -> MetadataResult<Self> {
        let status = HealthStatus::parse(&record.status).ok_or_else(|| {
            MetadataError::Internal(format!("unknown snapshot status: {}", record.status))
        })?;
        Ok(Self {
            id: record.id,
            created_at: record.created_at,
            status,
            latency_ms: u64::try_from(record.latency_ms).unwrap_or(0),
            modules: serde_json::from_str(&record.modules)?,
        })
    }
}

impl SqliteSnapshotStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!(path = %path.display(), "Opened SQLite snapshot store");
        Ok(store)
    }

    /// Apply the schema. Idempotent.
    pub async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotRepo for SqliteSnapshotStore {
    async fn latest_snapshot(&self) -> MetadataResult<Option<SnapshotRow>> {
        let record = sqlx::query_as::<_, SnapshotRecord>(
            // ids are assigned in insertion order, which is creation order
            "SELECT id, created_at, status, latency_ms, modules FROM system_metrics \
             ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        record.map(SnapshotRow::try_from).transpose()
    }

    async fn insert_snapshot(&self, snapshot: &NewSnapshot) -> MetadataResult<SnapshotRow> {
        let modules = serde_json::to_string(&snapshot.modules)?;
        let latency_ms = i64::try_from(snapshot.latency_ms).unwrap_or(i64::MAX);
        // Millisecond precision so the returned row matches what a later read decodes.
        let now = OffsetDateTime::now_utc();
        let created_at = now
            .replace_nanosecond(now.millisecond() as u32 * 1_000_000)
            .map_err(|e| MetadataError::Internal(e.to_string()))?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO system_metrics (created_at, status, latency_ms, modules) \
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(created_at)
        .bind(snapshot.status.as_str())
        .bind(latency_ms)
        .bind(&modules)
        .fetch_one(&self.pool)
        .await?;

        Ok(SnapshotRow {
            id,
            created_at,
            status: snapshot.status,
            latency_ms: snapshot.latency_ms,
            modules: snapshot.modules.clone(),
        })
    }

    fn store_name(&self) -> &'static str {
        "sqlite"
    }

    async fn check_store(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1 FROM system_metrics LIMIT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS system_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('healthy', 'degraded')),
    latency_ms INTEGER NOT NULL,
    modules TEXT NOT NULL DEFAULT '[]'
);
"#;
