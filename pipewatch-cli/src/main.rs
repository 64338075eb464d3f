//! Pipewatch CLI
//!
//! Command-line interface for following pipeline runs: list runs, show the
//! resolved step graph of a run, and watch a run live.

mod commands;
mod config;
mod render;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pipewatch")]
#[command(about = "Pipeline run monitor", long_about = None)]
struct Cli {
    /// Backend API URL
    #[arg(long, env = "PIPEWATCH_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Horizontal distance between graph nodes
    #[arg(long, env = "PIPEWATCH_NODE_SPACING", default_value_t = 250.0)]
    spacing: f64,

    /// Timeout for non-streaming requests, in seconds
    #[arg(long, env = "PIPEWATCH_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with rendered output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipewatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        node_spacing: cli.spacing,
        request_timeout: Duration::from_secs(cli.timeout_secs),
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
