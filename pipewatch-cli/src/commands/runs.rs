//! Run command handlers
//!
//! Lists runs and shows the resolved step graph of a single run.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use pipewatch_core::JobView;

use crate::config::Config;
use crate::render;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunsCommands {
    /// List all runs
    List,
    /// Show a run and its step graph
    Show {
        /// Run ID or unambiguous prefix
        id: String,

        /// Print the graph as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Handle run commands
pub async fn handle_runs_command(command: RunsCommands, config: &Config) -> Result<()> {
    match command {
        RunsCommands::List => list_runs(config).await,
        RunsCommands::Show { id, json } => show_run(config, &id, json).await,
    }
}

/// List all runs
async fn list_runs(config: &Config) -> Result<()> {
    let mut store = config.store();
    let runs = store.refresh().await.context("Failed to fetch runs")?;

    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", runs.len()).bold());
        println!();
        for run in runs {
            render::print_run_summary(run);
        }
    }

    Ok(())
}

/// Resolve the stored record of a run once and display it
async fn show_run(config: &Config, id: &str, json: bool) -> Result<()> {
    let mut store = config.store();
    store.refresh().await.context("Failed to fetch runs")?;

    let run_id = store.resolve_prefix(id)?;
    let run = store
        .find(&run_id)
        .with_context(|| format!("Run {} disappeared from the listing", run_id))?;

    let view = JobView::derive(run.record.clone(), &config.graph_builder(run.job_type()));

    if json {
        render::print_graph_json(&view.graph)?;
    } else {
        render::print_run_details(run, &view);
        println!();
        render::print_legend();
    }

    Ok(())
}
