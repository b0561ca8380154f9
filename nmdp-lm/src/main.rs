//! NMDP Legacy Migration (nmdp-lm) - Main entry point
//!
//! Batch engine that reconciles the legacy flat export and the legacy
//! remote platform into the NMDP relational schema. Idempotently
//! re-runnable; exit code 0 only on a completed run. Per-record failures
//! are reported in the statistics and do not change the exit code.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nmdp_lm::config::EngineConfig;
use nmdp_lm::extract::{FlatExportExtractor, RemoteApiExtractor};
use nmdp_lm::models::RunState;
use nmdp_lm::MigrationOrchestrator;

/// Command-line arguments for nmdp-lm
#[derive(Parser, Debug)]
#[command(name = "nmdp-lm")]
#[command(about = "Legacy data migration engine for NMDP")]
#[command(version)]
struct Args {
    /// Path to the platform SQLite database
    #[arg(short, long, env = "NMDP_DATABASE")]
    database: Option<String>,

    /// Directory containing the legacy CSV export
    #[arg(short, long, env = "NMDP_LEGACY_EXPORT_DIR")]
    export_dir: Option<String>,

    /// Base URL of the legacy remote platform API
    #[arg(long, env = "NMDP_LEGACY_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the legacy remote platform API
    #[arg(long, env = "NMDP_LEGACY_API_TOKEN")]
    api_token: Option<String>,

    /// Directory for audit artifacts
    #[arg(long, env = "NMDP_AUDIT_DIR")]
    audit_dir: Option<String>,

    /// Skip the remote platform source, run from the flat export alone
    #[arg(long)]
    skip_remote: bool,

    /// Create the platform schema before running (first-time setup)
    #[arg(long)]
    init_schema: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nmdp_lm=info,nmdp_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting nmdp-lm (Legacy Migration)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::resolve(
        args.database.as_deref(),
        args.export_dir.as_deref(),
        args.api_url.as_deref(),
        args.api_token.as_deref(),
        args.audit_dir.as_deref(),
    )?;

    info!("Database: {}", config.database_path.display());
    info!("Flat export: {}", config.export_dir.display());

    let pool = if args.init_schema {
        nmdp_common::db::init_database(&config.database_path).await?
    } else {
        nmdp_common::db::connect_database(&config.database_path).await?
    };

    let flat = FlatExportExtractor::new(&config.export_dir);
    let remote = if args.skip_remote {
        info!("Remote platform source skipped by request");
        None
    } else {
        match (&config.api_url, &config.api_token) {
            (Some(url), Some(token)) => {
                info!("Remote platform: {url}");
                Some(RemoteApiExtractor::new(url, token)?)
            }
            _ => {
                warn!("Remote platform not configured, using flat export only");
                None
            }
        }
    };

    let orchestrator = MigrationOrchestrator::new(pool, flat, remote, config.audit_dir.clone());
    let run = orchestrator.run().await;

    match run.state {
        RunState::Completed => {
            if run.statistics.total_failed() > 0 {
                warn!(
                    failed = run.statistics.total_failed(),
                    "Run completed with per-record failures, see statistics"
                );
            }
            Ok(())
        }
        _ => {
            error!(
                error = run.error.as_deref().unwrap_or("unknown"),
                "Migration aborted"
            );
            std::process::exit(1);
        }
    }
}
