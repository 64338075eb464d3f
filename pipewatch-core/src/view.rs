//! Job views
//!
//! A [`JobView`] bundles one full derivation: the record it came from, the
//! resolved steps and the graph built from them.

use serde::Serialize;

use crate::domain::job::{JobRecord, JobType};
use crate::domain::step::ResolvedStep;
use crate::graph::{Graph, GraphBuilder};
use crate::resolver;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub record: JobRecord,
    pub steps: Vec<ResolvedStep>,
    pub graph: Graph,
}

impl JobView {
    /// Resolves `record` against the builder's catalog and builds its graph
    pub fn derive(record: JobRecord, builder: &GraphBuilder) -> Self {
        let steps = resolver::resolve(builder.job_type(), &record);
        let graph = builder.build(&steps);
        Self {
            record,
            steps,
            graph,
        }
    }

    pub fn job_type(&self) -> JobType {
        self.record.job_type
    }

    /// The step the pipeline is at, if any
    pub fn active_step(&self) -> Option<&ResolvedStep> {
        resolver::active_step(&self.steps).map(|idx| &self.steps[idx])
    }
}
