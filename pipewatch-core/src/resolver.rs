//! Step status resolution
//!
//! Reconstructs the state of every catalog step from a single job record.
//! The result depends on nothing but the catalog and the record, so resolving
//! the same record twice yields identical output.
//!
//! Rules, by whole-job status:
//! - `completed`: every step completed; the last step carries the result and a
//!   subtitle rendered from its counters.
//! - `failed`: step 0 failed (subtitle is the error message), everything else
//!   pending. The step that was running when the job failed is not tracked.
//! - `running`: the step matching `current_step` is running with the record's
//!   progress, earlier steps completed, later steps pending. An unrecognized or
//!   missing label falls back to step 0 running.
//! - `pending`: step 0 running without progress, everything else pending.

use tracing::debug;

use crate::catalog::{self, StepDefinition, StepMatch};
use crate::domain::job::{JobRecord, JobStatus, JobType};
use crate::domain::step::{ResolvedStep, StepStatus};

/// Resolves a record against the catalog of `job_type`
pub fn resolve(job_type: JobType, record: &JobRecord) -> Vec<ResolvedStep> {
    resolve_with(catalog::steps_for(job_type), record)
}

/// Resolves a record against an explicit catalog
pub fn resolve_with(steps: &[StepDefinition], record: &JobRecord) -> Vec<ResolvedStep> {
    match record.status {
        JobStatus::Completed => completed(steps, record),
        JobStatus::Failed => failed(steps, record),
        JobStatus::Running => {
            let located = record
                .current_step
                .as_deref()
                .and_then(|label| catalog::locate(steps, label));

            match located {
                Some((idx, matched)) => {
                    running_at(steps, idx, &matched, record.progress_percent())
                }
                None => {
                    debug!(
                        run_id = %record.run_id,
                        current_step = ?record.current_step,
                        "Unrecognized current step, showing first step as running"
                    );
                    first_step_running(steps)
                }
            }
        }
        JobStatus::Pending => first_step_running(steps),
    }
}

/// Index of the step the pipeline is at (running or failed), if any
pub fn active_step(steps: &[ResolvedStep]) -> Option<usize> {
    steps.iter().position(|s| s.status.is_active())
}

fn step(def: &StepDefinition, status: StepStatus, subtitle: String) -> ResolvedStep {
    ResolvedStep {
        key: def.key.name().to_string(),
        title: def.title.to_string(),
        subtitle,
        status,
        progress: None,
        result: None,
    }
}

fn completed(steps: &[StepDefinition], record: &JobRecord) -> Vec<ResolvedStep> {
    let last = steps.len().saturating_sub(1);

    steps
        .iter()
        .enumerate()
        .map(|(idx, def)| {
            if idx == last {
                let mut resolved = step(
                    def,
                    StepStatus::Completed,
                    def.result_subtitle(record.result.as_ref()),
                );
                resolved.result = record.result.clone();
                resolved
            } else {
                step(def, StepStatus::Completed, def.default_subtitle())
            }
        })
        .collect()
}

fn failed(steps: &[StepDefinition], record: &JobRecord) -> Vec<ResolvedStep> {
    steps
        .iter()
        .enumerate()
        .map(|(idx, def)| {
            if idx == 0 {
                let subtitle = record
                    .error_message
                    .clone()
                    .unwrap_or_else(|| def.default_subtitle());
                step(def, StepStatus::Failed, subtitle)
            } else {
                step(def, StepStatus::Pending, def.default_subtitle())
            }
        })
        .collect()
}

fn running_at(
    steps: &[StepDefinition],
    matched_idx: usize,
    matched: &StepMatch,
    progress: u8,
) -> Vec<ResolvedStep> {
    steps
        .iter()
        .enumerate()
        .map(|(idx, def)| match idx.cmp(&matched_idx) {
            std::cmp::Ordering::Less => {
                step(def, StepStatus::Completed, def.default_subtitle())
            }
            std::cmp::Ordering::Equal => {
                let mut resolved =
                    step(def, StepStatus::Running, def.matched_subtitle(matched));
                resolved.progress = Some(progress);
                resolved
            }
            std::cmp::Ordering::Greater => step(def, StepStatus::Pending, def.default_subtitle()),
        })
        .collect()
}

fn first_step_running(steps: &[StepDefinition]) -> Vec<ResolvedStep> {
    steps
        .iter()
        .enumerate()
        .map(|(idx, def)| {
            let status = if idx == 0 {
                StepStatus::Running
            } else {
                StepStatus::Pending
            };
            step(def, status, def.default_subtitle())
        })
        .collect()
}
