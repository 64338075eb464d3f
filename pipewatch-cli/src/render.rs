//! Terminal rendering
//!
//! Prints run summaries and resolved step graphs as coloured text. Node and
//! edge colours follow the graph styles, so the terminal shows the same status
//! policy a graphical renderer would.

use colored::*;
use pipewatch_core::graph::legend;
use pipewatch_core::{Graph, JobStatus, JobView, NodeStyle, RunSummary, StepStatus};

const BAR_WIDTH: usize = 20;

/// Print one line of the run listing
pub fn print_run_summary(run: &RunSummary) {
    println!(
        "  {} {} {:<11} {:<10}{}",
        "▸".cyan(),
        run.run_id().dimmed(),
        run.job_type().to_string(),
        colorize_status(run.status()),
        run.created_at
            .map(|at| format!(" {}", at.format("%Y-%m-%d %H:%M:%S")).dimmed().to_string())
            .unwrap_or_default()
    );
}

/// Print run details followed by its step graph
pub fn print_run_details(run: &RunSummary, view: &JobView) {
    println!("{}", "Run Details:".bold());
    println!("  Run ID:   {}", run.run_id().cyan());
    println!("  Job ID:   {}", run.record.id.dimmed());
    println!("  Type:     {}", run.job_type());
    println!("  Status:   {}", colorize_status(run.status()));

    if let Some(created) = run.created_at {
        println!("  Created:  {}", created.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(updated) = run.updated_at {
        println!("  Updated:  {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(elapsed) = run.elapsed() {
        println!("  Duration: {}s", elapsed.num_seconds());
    }

    println!();
    print_view(view);
}

/// Print the resolved steps of a view as a vertical pipeline
pub fn print_view(view: &JobView) {
    let graph = &view.graph;

    for (idx, node) in graph.nodes.iter().enumerate() {
        if idx > 0 {
            if let Some(edge) = graph.edges.iter().find(|e| e.target == node.id) {
                let connector = if edge.animated { "┃" } else { "│" };
                println!("   {}", paint(connector, edge.style));
            }
        }

        let marker = match node.data.status {
            StepStatus::Completed => "✓",
            StepStatus::Running => "●",
            StepStatus::Failed => "✗",
            StepStatus::Pending => "○",
        };

        let mut line = format!(
            "  {} {}  {}",
            paint(marker, node.style),
            paint(&node.data.title, node.style).bold(),
            node.data.subtitle.dimmed()
        );
        if let Some(progress) = node.data.progress {
            line.push_str(&format!("  {}", progress_bar(progress)));
        }
        println!("{}", line);
    }

    if let Some(message) = &view.record.error_message {
        if view.record.status == JobStatus::Failed {
            println!("\n{}", "Error:".bold());
            println!("{}", message.red());
        }
    }
}

/// Print the status legend
pub fn print_legend() {
    let entries: Vec<String> = legend()
        .iter()
        .map(|entry| format!("{} {}", paint("■", entry.status.into()), entry.label))
        .collect();
    println!("{}", entries.join("   "));
}

/// Print the graph as one line of JSON
pub fn print_graph_json(graph: &Graph) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(graph)?);
    Ok(())
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!(
        "{}{} {:>3}%",
        "█".repeat(filled).blue(),
        "░".repeat(BAR_WIDTH - filled).dimmed(),
        progress
    )
}

fn paint(text: &str, style: NodeStyle) -> ColoredString {
    match style {
        NodeStyle::Accent => text.green(),
        NodeStyle::Primary => text.blue(),
        NodeStyle::Destructive => text.red(),
        NodeStyle::Neutral => text.dimmed(),
    }
}

/// Colorize job status for display
pub fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        colored::control::set_override(false);
        assert_eq!(progress_bar(0), format!("{}   0%", "░".repeat(BAR_WIDTH)));
        assert_eq!(progress_bar(100), format!("{} 100%", "█".repeat(BAR_WIDTH)));
        assert_eq!(
            progress_bar(45),
            format!("{}{}  45%", "█".repeat(9), "░".repeat(11))
        );
    }
}
