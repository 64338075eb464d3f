//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::job::{JobRecord, JobStatus, JobType};

/// Entry of the run listing
///
/// A run summary is the last known [`JobRecord`] of a run plus its timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    #[serde(flatten)]
    pub record: JobRecord,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(record: JobRecord) -> Self {
        Self {
            record,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.record.run_id
    }

    pub fn job_type(&self) -> JobType {
        self.record.job_type
    }

    pub fn status(&self) -> JobStatus {
        self.record.status
    }

    /// Wall-clock duration between creation and the last update, if both are known
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        match (self.created_at, self.updated_at) {
            (Some(created), Some(updated)) => Some(updated.signed_duration_since(created)),
            _ => None,
        }
    }
}

impl From<RunSummary> for JobRecord {
    fn from(summary: RunSummary) -> Self {
        summary.record
    }
}
