//! Graph building
//!
//! Turns resolved steps into the node and edge records consumed by renderers.
//! The pipeline is strictly linear: nodes sit on a single row in catalog order
//! and every consecutive pair is joined by one edge.
//!
//! Identifiers only depend on the job type and the step index, so rebuilding
//! the graph for a new record keeps them stable and renderers can diff nodes.

use serde::{Deserialize, Serialize};

use crate::domain::job::{JobResult, JobType};
use crate::domain::step::{ResolvedStep, StepStatus};

/// Horizontal distance between two nodes
pub const DEFAULT_NODE_SPACING: f64 = 250.0;

/// Visual style of a node or edge, derived from a step status only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStyle {
    Accent,
    Primary,
    Destructive,
    Neutral,
}

impl From<StepStatus> for NodeStyle {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Completed => NodeStyle::Accent,
            StepStatus::Running => NodeStyle::Primary,
            StepStatus::Failed => NodeStyle::Destructive,
            StepStatus::Pending => NodeStyle::Neutral,
        }
    }
}

impl StepStatus {
    /// Legend color of the status, as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            StepStatus::Completed => "#10b981",
            StepStatus::Running => "#3b82f6",
            StepStatus::Failed => "#ef4444",
            StepStatus::Pending => "#9ca3af",
        }
    }

    /// Human-readable legend label
    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::Completed => "Completed",
            StepStatus::Running => "Running",
            StepStatus::Failed => "Failed",
            StepStatus::Pending => "Pending",
        }
    }
}

/// One legend row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub status: StepStatus,
    pub label: &'static str,
    pub color: &'static str,
}

/// Legend rows in display order
pub fn legend() -> [LegendEntry; 4] {
    [
        StepStatus::Completed,
        StepStatus::Running,
        StepStatus::Failed,
        StepStatus::Pending,
    ]
    .map(|status| LegendEntry {
        status,
        label: status.label(),
        color: status.color(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Content displayed inside a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub key: String,
    pub title: String,
    pub subtitle: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub position: Position,
    pub data: NodeData,
    pub style: NodeStyle,
    pub animated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub animated: bool,
    pub style: NodeStyle,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn animated_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(|e| e.animated)
    }
}

/// Builds graphs for one pipeline kind
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    job_type: JobType,
    spacing: f64,
}

impl GraphBuilder {
    pub fn new(job_type: JobType) -> Self {
        Self {
            job_type,
            spacing: DEFAULT_NODE_SPACING,
        }
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Node id of the step at `idx`
    pub fn node_id(&self, idx: usize) -> String {
        format!("{}-{}", self.job_type, idx)
    }

    pub fn build(&self, steps: &[ResolvedStep]) -> Graph {
        let nodes: Vec<GraphNode> = steps
            .iter()
            .enumerate()
            .map(|(idx, step)| GraphNode {
                id: self.node_id(idx),
                position: Position {
                    x: idx as f64 * self.spacing,
                    y: 0.0,
                },
                data: NodeData {
                    key: step.key.clone(),
                    title: step.title.clone(),
                    subtitle: step.subtitle.clone(),
                    status: step.status,
                    progress: step.progress,
                    result: step.result.clone(),
                },
                style: step.status.into(),
                animated: step.status == StepStatus::Running,
            })
            .collect();

        let edges = nodes
            .windows(2)
            .map(|pair| {
                let (source, target) = (&pair[0], &pair[1]);
                let status = target.data.status;
                GraphEdge {
                    id: format!("e-{}-{}", source.id, target.id),
                    source: source.id.clone(),
                    target: target.id.clone(),
                    animated: status == StepStatus::Running,
                    style: status.into(),
                    color: status.color().to_string(),
                }
            })
            .collect();

        Graph { nodes, edges }
    }
}
