//! Pipewatch Core
//!
//! Step-status derivation for pipeline jobs.
//!
//! This crate contains:
//! - Domain types: job records, run summaries, resolved steps
//! - DTOs: push stream message shapes
//! - The step catalog of each pipeline kind
//! - The resolver, which rebuilds every step's status from one job record
//! - The graph builder, which projects resolved steps into nodes and edges
//!
//! Everything here is pure and synchronous; I/O lives in `pipewatch-client`
//! and `pipewatch-monitor`.

pub mod catalog;
pub mod domain;
pub mod dto;
pub mod graph;
pub mod resolver;
pub mod view;

pub use domain::job::{JobRecord, JobResult, JobStatus, JobType};
pub use domain::run::RunSummary;
pub use domain::step::{ResolvedStep, StepStatus};
pub use dto::stream::{DecodeError, StreamMessage};
pub use graph::{Graph, GraphBuilder, GraphEdge, GraphNode, NodeStyle};
pub use resolver::resolve;
pub use view::JobView;
