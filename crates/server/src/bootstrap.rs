//! Configuration loading and backend wiring.

use crate::state::AppState;
use anyhow::{Context, Result};
use bastion_core::config::AppConfig;
use bastion_traffic::{CloudflareClient, TrafficError};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::path::Path;
use std::sync::Arc;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/bastion.toml";

/// Plain environment variables and the config keys they set.
///
/// Later entries win, so `SUPABASE_URL` overrides `NEXT_PUBLIC_SUPABASE_URL`.
pub const ENV_ALIASES: &[(&str, &str)] = &[
    ("NEXT_PUBLIC_SUPABASE_URL", "backend.url"),
    ("SUPABASE_URL", "backend.url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "backend.service_key"),
    ("ADMIN_WIPE_TOKEN", "admin.wipe_token"),
    ("METRICS_REFRESH_TOKEN", "metrics.refresh_token"),
    ("CLOUDFLARE_API_TOKEN", "traffic.api_token"),
    ("CLOUDFLARE_ZONE_ID", "traffic.zone_id"),
];

/// `BASTION_` variables read by the binaries or the CLI, not by the config.
const CLIENT_ONLY_VARS: &[&str] = &["config", "server", "admin_token", "metrics_token"];

/// Layered configuration: optional TOML file, then `BASTION_` variables
/// split on `__`, then the plain aliases in [`ENV_ALIASES`].
pub fn figment(config_path: &Path) -> Figment {
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %config_path.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(config_path));
    } else {
        tracing::debug!("No config file found at {}", config_path.display());
    }

    figment = figment.merge(
        Env::prefixed("BASTION_")
            .ignore(CLIENT_ONLY_VARS)
            .split("__"),
    );
    for (var, key) in ENV_ALIASES {
        let key: &'static str = key;
        figment = figment.merge(Env::raw().only(&[*var]).map(move |_| key.into()));
    }
    figment
}

/// Load and validate configuration.
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    let config: AppConfig = figment(config_path)
        .extract()
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Build application state, attaching every backend whose settings exist.
///
/// Missing credentials are logged and left empty; requests that need them
/// fail with a configuration error.
pub async fn build_state(config: AppConfig) -> Result<AppState> {
    let storage = bastion_storage::from_config(&config.backend)
        .context("failed to initialize storage client")?;
    let database = bastion_metadata::database_from_config(&config.backend)
        .context("failed to initialize database client")?;
    let snapshots = bastion_metadata::snapshots_from_config(&config.metrics.store, &config.backend)
        .await
        .context("failed to initialize snapshot store")?;
    let analytics = match CloudflareClient::from_config(&config.traffic) {
        Ok(client) => Some(client),
        Err(TrafficError::MissingConfig { required }) => {
            tracing::warn!(?required, "Traffic analytics not configured");
            None
        }
        Err(e) => return Err(e).context("failed to initialize analytics client"),
    };

    if config.probes.is_empty() {
        tracing::warn!("No probe targets configured; health snapshots will be empty");
    } else {
        tracing::info!(probes = config.probes.len(), "Probe targets loaded");
    }
    if storage.is_none() || database.is_none() {
        tracing::warn!("Backend URL or service key missing; wipe and health endpoints disabled");
    }

    let mut state = AppState::new(config);
    if let Some(storage) = storage {
        tracing::info!(backend = storage.backend_name(), "Storage client initialized");
        state = state.with_storage(storage);
    }
    if let Some(database) = database {
        tracing::info!(backend = database.backend_name(), "Database client initialized");
        state = state.with_database(database);
    }
    if let Some(snapshots) = snapshots {
        tracing::info!(store = snapshots.store_name(), "Snapshot store initialized");
        state = state.with_snapshots(snapshots);
    }
    if let Some(analytics) = analytics {
        state = state.with_analytics(Arc::new(analytics));
    }
    Ok(state)
}

/// Check each attached backend once and log the result.
///
/// An unreachable backend does not stop startup; requests that need it
/// report their own failure. Returns the names of the checks that failed.
pub async fn check_connectivity(state: &AppState) -> Vec<&'static str> {
    let mut failed = Vec::new();

    if let Some(storage) = &state.storage {
        let result = storage.health_check().await.map_err(|e| e.to_string());
        log_check("storage", storage.backend_name(), result, &mut failed);
    }
    if let Some(database) = &state.database {
        let result = database.health_check().await.map_err(|e| e.to_string());
        log_check("database", database.backend_name(), result, &mut failed);
    }
    if let Some(snapshots) = &state.snapshots {
        let result = snapshots.check_store().await.map_err(|e| e.to_string());
        log_check("snapshots", snapshots.store_name(), result, &mut failed);
    }
    failed
}

fn log_check(
    check: &'static str,
    backend: &str,
    result: std::result::Result<(), String>,
    failed: &mut Vec<&'static str>,
) {
    match result {
        Ok(()) => tracing::info!(check, backend, "Connectivity verified"),
        Err(error) => {
            tracing::warn!(check, backend, %error, "Connectivity check failed");
            failed.push(check);
        }
    }
}
