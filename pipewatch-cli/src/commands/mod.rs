//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod runs;
mod watch;

pub use runs::RunsCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run listing and inspection
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    /// Follow a run live until it finishes
    Watch {
        /// Run ID or unambiguous prefix
        id: String,

        /// Print the graph as JSON on every update
        #[arg(long)]
        json: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Runs { command } => runs::handle_runs_command(command, config).await,
        Commands::Watch { id, json } => watch::watch_run(config, &id, json).await,
    }
}
