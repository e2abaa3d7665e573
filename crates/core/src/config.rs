//! Configuration types shared across crates.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration.
///
/// Every credential is optional at load time. Handlers check for the values
/// they need and report a configuration error per request, so a partially
/// configured server still serves the endpoints it can.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
}

impl AppConfig {
    /// Configuration with placeholder credentials and small probe lists.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig {
                url: Some("http://127.0.0.1:54321".to_string()),
                service_key: Some("test-service-key".to_string()),
            },
            admin: AdminConfig {
                wipe_token: Some("test-admin-token".to_string()),
                ..Default::default()
            },
            metrics: MetricsConfig::default(),
            probes: ProbeConfig {
                tables: vec![ProbeTarget::new("pendaftar", "Pendaftar", "core")],
                buckets: vec![ProbeTarget::new(
                    "pendaftar-files",
                    "Pendaftar Files",
                    "storage",
                )],
                bucket_list_limit: default_bucket_list_limit(),
            },
            traffic: TrafficConfig {
                api_token: Some("test-cf-token".to_string()),
                zone_id: Some("test-zone".to_string()),
                endpoint: default_traffic_endpoint(),
            },
        }
    }

    /// Validate invariants that would make the server misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        self.admin.validate()?;
        self.metrics.validate()?;
        self.probes.validate()?;
        Ok(())
    }
}

/// Treat unset and empty values the same way.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Backend-as-a-service connection (object storage and database REST APIs).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co").
    pub url: Option<String>,
    /// Service credential sent as both `apikey` and bearer token.
    /// WARNING: Prefer the SUPABASE_SERVICE_ROLE_KEY env var over config files.
    pub service_key: Option<String>,
}

/// Resolved backend credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendCredentials {
    pub url: String,
    pub service_key: String,
}

impl BackendConfig {
    /// Both URL and service key, or `None` when either is missing.
    pub fn credentials(&self) -> Option<BackendCredentials> {
        match (non_empty(&self.url), non_empty(&self.service_key)) {
            (Some(url), Some(key)) => Some(BackendCredentials {
                url: url.trim_end_matches('/').to_string(),
                service_key: key.to_string(),
            }),
            _ => None,
        }
    }
}

/// Destructive wipe configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Shared secret expected in the `x-admin-token` header.
    /// When unset, every wipe request is rejected.
    pub wipe_token: Option<String>,
    /// Bucket emptied by the wipe.
    #[serde(default = "default_wipe_bucket")]
    pub bucket: String,
    /// Stored procedure that truncates the registration tables.
    #[serde(default = "default_wipe_procedure")]
    pub procedure: String,
    /// Entries requested per storage listing page.
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,
    /// Paths per storage delete call.
    #[serde(default = "default_remove_batch_size")]
    pub remove_batch_size: usize,
}

fn default_wipe_bucket() -> String {
    "pendaftar-files".to_string()
}

fn default_wipe_procedure() -> String {
    "admin_wipe_db".to_string()
}

fn default_list_page_size() -> usize {
    1000
}

fn default_remove_batch_size() -> usize {
    100
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            wipe_token: None,
            bucket: default_wipe_bucket(),
            procedure: default_wipe_procedure(),
            list_page_size: default_list_page_size(),
            remove_batch_size: default_remove_batch_size(),
        }
    }
}

impl AdminConfig {
    /// The configured wipe secret, if any.
    pub fn wipe_token(&self) -> Option<&str> {
        non_empty(&self.wipe_token)
    }

    pub fn validate(&self) -> Result<()> {
        if self.list_page_size == 0 {
            return Err(Error::InvalidConfig(
                "admin.list_page_size must be greater than zero".to_string(),
            ));
        }
        if self.remove_batch_size == 0 {
            return Err(Error::InvalidConfig(
                "admin.remove_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(Error::InvalidConfig("admin.bucket is empty".to_string()));
        }
        if self.procedure.trim().is_empty() {
            return Err(Error::InvalidConfig("admin.procedure is empty".to_string()));
        }
        Ok(())
    }
}

/// Health snapshot persistence configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Shared secret for the refresh endpoint. Refresh is open when unset.
    pub refresh_token: Option<String>,
    /// Snapshots younger than this are served instead of probing again.
    #[serde(default = "default_min_refresh_secs")]
    pub min_refresh_secs: u64,
    /// Where snapshots are persisted.
    #[serde(default)]
    pub store: SnapshotStoreConfig,
}

fn default_min_refresh_secs() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            refresh_token: None,
            min_refresh_secs: default_min_refresh_secs(),
            store: SnapshotStoreConfig::default(),
        }
    }
}

impl MetricsConfig {
    /// The configured refresh secret, if any.
    pub fn refresh_token(&self) -> Option<&str> {
        non_empty(&self.refresh_token)
    }

    /// Minimum age before a stored snapshot is recomputed.
    pub fn min_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.min_refresh_secs)
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate()
    }
}

/// Snapshot store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SnapshotStoreConfig {
    /// A table on the backend database, reached through its REST API.
    Backend {
        /// Table name.
        #[serde(default = "default_snapshot_table")]
        table: String,
    },
    /// Local SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

fn default_snapshot_table() -> String {
    "system_metrics".to_string()
}

impl Default for SnapshotStoreConfig {
    fn default() -> Self {
        Self::Backend {
            table: default_snapshot_table(),
        }
    }
}

impl SnapshotStoreConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Backend { table } if table.trim().is_empty() => Err(Error::InvalidConfig(
                "metrics.store.table is empty".to_string(),
            )),
            Self::Sqlite { path } if path.as_os_str().is_empty() => Err(Error::InvalidConfig(
                "metrics.store.path is empty".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// One named table or bucket to probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub name: String,
    pub label: String,
    pub category: String,
}

impl ProbeTarget {
    pub fn new(name: &str, label: &str, category: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            category: category.to_string(),
        }
    }
}

/// Health probe targets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Tables probed with a count-only query.
    #[serde(default = "default_probe_tables")]
    pub tables: Vec<ProbeTarget>,
    /// Buckets probed with a bounded root listing.
    #[serde(default = "default_probe_buckets")]
    pub buckets: Vec<ProbeTarget>,
    /// Maximum entries requested per bucket probe. Bucket file counts are
    /// capped at this value.
    #[serde(default = "default_bucket_list_limit")]
    pub bucket_list_limit: usize,
}

fn default_bucket_list_limit() -> usize {
    100
}

fn default_probe_tables() -> Vec<ProbeTarget> {
    [
        ("pendaftar", "Pendaftar", "core"),
        ("pembayaran", "Pembayaran", "core"),
        ("gelombang", "Gelombang", "core"),
        ("berita", "Berita", "cms"),
        ("hero_carousel_images", "Hero Carousel", "cms"),
        ("hero_images", "Hero Images", "cms"),
        ("brosur_items", "Brosur", "cms"),
        ("why_section", "Why Section", "cms"),
        ("alur_pendaftaran_steps", "Alur Steps", "ref"),
        ("biaya_items", "Biaya Items", "ref"),
        ("kontak_items", "Kontak Items", "ref"),
        ("kontak_settings", "Kontak Settings", "ref"),
        ("syarat_pendaftaran_items", "Syarat Items", "ref"),
        ("payment_settings", "Payment Settings", "ref"),
        ("maintenance_settings", "Maintenance", "ref"),
    ]
    .into_iter()
    .map(|(name, label, category)| ProbeTarget::new(name, label, category))
    .collect()
}

fn default_probe_buckets() -> Vec<ProbeTarget> {
    [
        ("pendaftar-files", "Pendaftar Files"),
        ("hero-carousel", "Hero Carousel"),
        ("hero-images", "Hero Images"),
        ("brosur-files", "Brosur Files"),
        ("temp-downloads", "Temp Downloads"),
    ]
    .into_iter()
    .map(|(name, label)| ProbeTarget::new(name, label, "storage"))
    .collect()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tables: default_probe_tables(),
            buckets: default_probe_buckets(),
            bucket_list_limit: default_bucket_list_limit(),
        }
    }
}

impl ProbeConfig {
    /// Total number of probes run per health check.
    pub fn len(&self) -> usize {
        self.tables.len() + self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.buckets.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_list_limit == 0 {
            return Err(Error::InvalidConfig(
                "probes.bucket_list_limit must be greater than zero".to_string(),
            ));
        }
        if let Some(target) = self
            .tables
            .iter()
            .chain(self.buckets.iter())
            .find(|t| t.name.trim().is_empty())
        {
            return Err(Error::InvalidConfig(format!(
                "probe target with label '{}' has an empty name",
                target.label
            )));
        }
        Ok(())
    }
}

/// Analytics API configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// API token with analytics read access.
    pub api_token: Option<String>,
    /// Zone identifier the queries are filtered on.
    pub zone_id: Option<String>,
    /// GraphQL endpoint.
    #[serde(default = "default_traffic_endpoint")]
    pub endpoint: String,
}

fn default_traffic_endpoint() -> String {
    "https://api.cloudflare.com/client/v4/graphql".to_string()
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            zone_id: None,
            endpoint: default_traffic_endpoint(),
        }
    }
}

/// Resolved analytics credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrafficCredentials {
    pub api_token: String,
    pub zone_id: String,
}

impl TrafficConfig {
    /// Environment names reported when credentials are missing.
    pub const REQUIRED_ENV: [&'static str; 2] = ["CLOUDFLARE_API_TOKEN", "CLOUDFLARE_ZONE_ID"];

    /// Token and zone, or `None` when either is missing.
    pub fn credentials(&self) -> Option<TrafficCredentials> {
        match (non_empty(&self.api_token), non_empty(&self.zone_id)) {
            (Some(token), Some(zone)) => Some(TrafficCredentials {
                api_token: token.to_string(),
                zone_id: zone.to_string(),
            }),
            _ => None,
        }
    }
}
