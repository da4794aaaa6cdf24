//! Broadcast scanning worker binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spotscan_worker::{metrics, ScanContext, ScanExecutor, ScanMode, WorkerConfig};

/// Command-line arguments for spotscan-worker
#[derive(Parser, Debug)]
#[command(name = "spotscan-worker")]
#[command(about = "Find reference clip airings in broadcast feature files")]
#[command(version)]
struct Args {
    /// Treat inputs as neighbor logs and only run tracking
    #[arg(long)]
    replay: bool,

    /// Print the batch summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Broadcast feature files, or neighbor logs with --replay
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("spotscan=info".parse().context("invalid log directive")?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let args = Args::parse();
    info!("Starting spotscan-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let metrics_handle = if config.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let ctx = ScanContext::new(config)
        .await
        .context("Failed to prepare scan context")?;
    let executor = ScanExecutor::new(ctx);

    let mode = if args.replay {
        ScanMode::Replay
    } else {
        ScanMode::Broadcast
    };
    let summary = executor.run(args.inputs, mode).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    if let Some(handle) = metrics_handle {
        println!("{}", handle.render());
    }

    if !summary.is_success() {
        error!(failed = summary.failed.len(), "Some inputs could not be scanned");
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
    Ok(())
}
