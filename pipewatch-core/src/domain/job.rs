//! Job domain types
//!
//! A [`JobRecord`] is the coarse snapshot the backend emits for a pipeline job.
//! It says which pipeline runs, the whole-job status, and a free-form label for
//! the step currently executing. Everything shown per step is derived from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Pipeline kind, selects the step catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Extraction,
    Enrichment,
}

impl JobType {
    /// Wire name of the job type, also used as node id prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Extraction => "extraction",
            JobType::Enrichment => "enrichment",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-job status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// The job will not produce further updates
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The job is still worth streaming
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Named counters reported by a completed job (tables, columns, kpis, ...)
///
/// Kept in key order so that anything rendered from it is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobResult(pub BTreeMap<String, serde_json::Value>);

impl JobResult {
    /// Reads a counter as an integer
    ///
    /// Floats with no fractional part and numeric strings are accepted, since
    /// backends are not consistent about how they serialize counts.
    pub fn counter(&self, name: &str) -> Option<u64> {
        match self.0.get(name)? {
            serde_json::Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Builder-style counter insertion
    pub fn with_counter(mut self, name: impl Into<String>, value: u64) -> Self {
        self.0.insert(name.into(), serde_json::Value::from(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Job status snapshot
///
/// Arrives repeatedly for the same run. Only `current_step` identifies the
/// executing step; `step_index` and `total_steps` are advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(alias = "run_id", deserialize_with = "opaque_id")]
    pub run_id: String,
    #[serde(alias = "job_type")]
    pub job_type: JobType,
    pub status: JobStatus,
    #[serde(default, alias = "current_step")]
    pub current_step: Option<String>,
    #[serde(default, alias = "step_index")]
    pub step_index: Option<u32>,
    #[serde(default, alias = "total_steps")]
    pub total_steps: Option<u32>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default, alias = "error_message")]
    pub error_message: Option<String>,
}

impl JobRecord {
    /// Creates a record with no step, progress, result or error
    pub fn new(
        id: impl Into<String>,
        run_id: impl Into<String>,
        job_type: JobType,
        status: JobStatus,
    ) -> Self {
        Self {
            id: id.into(),
            run_id: run_id.into(),
            job_type,
            status,
            current_step: None,
            step_index: None,
            total_steps: None,
            progress: None,
            result: None,
            error_message: None,
        }
    }

    pub fn with_current_step(mut self, step: impl Into<String>) -> Self {
        self.current_step = Some(step.into());
        self
    }

    pub fn with_progress(mut self, progress: u32) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_result(mut self, result: JobResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Progress percentage, clamped to 0..=100 (missing counts as 0)
    pub fn progress_percent(&self) -> u8 {
        self.progress.unwrap_or(0).min(100) as u8
    }
}

/// Accepts ids serialized either as strings or as numbers
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
