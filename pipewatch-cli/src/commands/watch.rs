//! Watch command handler
//!
//! Follows one run through the run list store and re-renders on every update
//! until the run finishes, the stream fails or the user presses Ctrl-C.

use anyhow::{Context, Result};
use colored::*;
use pipewatch_monitor::{ChannelEvent, Selection};
use tracing::info;

use crate::config::Config;
use crate::render;

enum Next {
    Interrupted,
    Event(Option<ChannelEvent>),
}

pub async fn watch_run(config: &Config, id: &str, json: bool) -> Result<()> {
    let mut store = config.store();
    store.refresh().await.context("Failed to fetch runs")?;

    let run_id = store.resolve_prefix(id)?;
    let selection = store.select(&run_id).await?;
    show(selection.view(), json)?;

    if let Selection::Finished(view) = &selection {
        if !json {
            println!();
            println!(
                "{}",
                format!("Run already {}; nothing to follow.", view.record.status).yellow()
            );
        }
        return Ok(());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let next = tokio::select! {
            _ = &mut ctrl_c => Next::Interrupted,
            event = store.next_event() => Next::Event(event),
        };

        match next {
            Next::Interrupted => {
                info!(run_id = %run_id, "Interrupted, closing subscription");
                store.deselect();
                break;
            }
            Next::Event(Some(ChannelEvent::Update(view))) => show(&view, json)?,
            Next::Event(Some(ChannelEvent::Done)) => {
                if !json {
                    let status = store
                        .find(&run_id)
                        .map(|run| render::colorize_status(run.status()).to_string())
                        .unwrap_or_else(|| "finished".to_string());
                    println!();
                    println!("{} {}", "Run finished:".bold(), status);
                }
                break;
            }
            Next::Event(Some(ChannelEvent::Error(message))) => {
                eprintln!("{} {}", "Stream closed:".red().bold(), message);
                break;
            }
            Next::Event(None) => break,
        }
    }

    Ok(())
}

fn show(view: &pipewatch_core::JobView, json: bool) -> Result<()> {
    if json {
        return render::print_graph_json(&view.graph);
    }

    println!();
    println!(
        "{} {} ({})",
        "Run".bold(),
        view.record.run_id.cyan(),
        render::colorize_status(view.record.status)
    );
    render::print_view(view);
    Ok(())
}
