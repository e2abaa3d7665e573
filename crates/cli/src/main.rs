//! Bastion CLI - operator commands for the admin service.

mod api_client;

use anyhow::Result;
use api_client::{ApiClient, WipeResponse};
use bastion_core::{HealthSnapshot, ModuleKind, ModuleStatus};
use bastion_traffic::TrafficReport;
use clap::{Args, Parser, Subcommand};

/// Phrase an operator must type to confirm a wipe.
const CONFIRM_PHRASE: &str = "HAPUS SEMUA";

#[derive(Parser)]
#[command(name = "bastionctl")]
#[command(about = "Bastion admin service CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ServerArgs {
    /// Server URL
    #[arg(long, env = "BASTION_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete every stored file and truncate the database tables
    Wipe {
        /// Confirmation phrase; must be "HAPUS SEMUA"
        #[arg(long)]
        confirm: Option<String>,
        /// Admin wipe token
        #[arg(long = "admin-token", env = "BASTION_ADMIN_TOKEN", hide_env_values = true)]
        admin_token: Option<String>,
        #[command(flatten)]
        api: ServerArgs,
    },
    /// Probe every table and bucket now
    Health {
        #[command(flatten)]
        api: ServerArgs,
    },
    /// Show the latest stored metrics snapshot
    Metrics {
        /// Request a new snapshot (served from storage when one is recent)
        #[arg(long)]
        refresh: bool,
        /// Metrics refresh token
        #[arg(long = "metrics-token", env = "BASTION_METRICS_TOKEN", hide_env_values = true)]
        metrics_token: Option<String>,
        #[command(flatten)]
        api: ServerArgs,
    },
    /// Show edge traffic for the trailing window
    Traffic {
        #[command(flatten)]
        api: ServerArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Wipe {
            confirm,
            admin_token,
            api,
        } => handle_wipe(confirm.as_deref(), admin_token.as_deref(), &api).await,
        Commands::Health { api } => {
            let client = ApiClient::new(&api.server)?;
            let snapshot = client.system_health().await?;
            print_snapshot(&snapshot);
            Ok(())
        }
        Commands::Metrics {
            refresh,
            metrics_token,
            api,
        } => handle_metrics(refresh, metrics_token.as_deref(), &api).await,
        Commands::Traffic { api } => {
            let client = ApiClient::new(&api.server)?;
            let report = client.traffic().await?;
            print_traffic(&report);
            Ok(())
        }
    }
}

fn confirmation_matches(input: &str) -> bool {
    input.trim().to_uppercase() == CONFIRM_PHRASE
}

async fn handle_wipe(
    confirm: Option<&str>,
    admin_token: Option<&str>,
    api: &ServerArgs,
) -> Result<()> {
    if !confirm.is_some_and(confirmation_matches) {
        anyhow::bail!("wipe not confirmed: pass --confirm \"{CONFIRM_PHRASE}\"");
    }
    let admin_token = admin_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("admin token required (--admin-token or BASTION_ADMIN_TOKEN)"))?;

    let client = ApiClient::new(&api.server)?;
    tracing::debug!(server = %api.server, "Sending wipe request");
    let report = client.wipe(admin_token).await?;
    print_wipe(&report);
    if !report.ok {
        anyhow::bail!("wipe incomplete");
    }
    Ok(())
}

async fn handle_metrics(refresh: bool, metrics_token: Option<&str>, api: &ServerArgs) -> Result<()> {
    let client = ApiClient::new(&api.server)?;
    if refresh {
        let snapshot = client.refresh_metrics(metrics_token).await?;
        print_snapshot(&snapshot);
        return Ok(());
    }
    match client.latest_metrics().await? {
        Some(snapshot) => print_snapshot(&snapshot),
        None => println!("No snapshot stored yet. Run with --refresh to create one."),
    }
    Ok(())
}

fn print_wipe(report: &WipeResponse) {
    println!("Bucket: {}", report.storage.bucket);
    println!("Files listed: {}", report.storage.listed_files);
    println!("Files deleted: {}", report.storage.deleted_files);
    println!(
        "Database truncated: {}",
        if report.db.truncated { "yes" } else { "no" }
    );
    if let Some(error) = &report.error {
        eprintln!("Error: {error}");
    }
}

fn module_value(module: &ModuleStatus) -> String {
    match module.kind {
        ModuleKind::Table => module
            .count
            .map(|c| format!("{c} rows"))
            .unwrap_or_else(|| "-".to_string()),
        ModuleKind::Storage => module
            .file_count
            .map(|c| format!("{c} files"))
            .unwrap_or_else(|| "-".to_string()),
    }
}

fn print_snapshot(snapshot: &HealthSnapshot) {
    println!("Status: {}", snapshot.status.as_str());
    println!("Checked at: {}", snapshot.timestamp);
    println!("Latency: {} ms", snapshot.latency);
    println!(
        "Modules: {} ({} failed)",
        snapshot.modules.len(),
        snapshot.failed_modules()
    );
    println!();
    println!(
        "{:<8} {:<28} {:<6} {:>14} {:>8}",
        "TYPE", "NAME", "STATUS", "VALUE", "LATENCY"
    );
    for module in &snapshot.modules {
        println!(
            "{:<8} {:<28} {:<6} {:>14} {:>6}ms",
            module.kind.as_str(),
            module.name,
            if module.is_error() { "error" } else { "ok" },
            module_value(module),
            module.latency
        );
        if let Some(error) = &module.error {
            println!("         {error}");
        }
    }
}

fn print_traffic(report: &TrafficReport) {
    println!(
        "Window: last {} minutes ({} buckets)",
        report.window_minutes,
        report.granularity.as_str()
    );
    println!("Requests: {}", report.totals.requests);
    println!("Cached requests: {}", report.totals.cached_requests);
    println!("Bytes: {}", report.totals.bytes);
    println!("Avg RPS: {:.2}", report.rates.avg_rps);
    println!("Peak RPS: {:.2}", report.rates.peak_rps);
    println!("Cache hit: {:.1}%", report.rates.cache_hit_percent);
    println!(
        "Avg bandwidth: {} B/s",
        report.rates.avg_bandwidth_bytes_per_sec
    );
}
