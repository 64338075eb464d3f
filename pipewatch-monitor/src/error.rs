//! Error types for run monitoring

use thiserror::Error;

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors surfaced by the run store and live channels
///
/// Stream-level failures are not errors here: they close the channel and are
/// reported as [`crate::ChannelEvent::Error`].
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No run with this id in the current run list
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// A run id prefix matched more than one run
    #[error("Ambiguous prefix '{prefix}' matches multiple runs: {}", .matches.join(", "))]
    AmbiguousPrefix {
        prefix: String,
        matches: Vec<String>,
    },

    /// The run listing collaborator failed
    #[error("Failed to list runs: {0}")]
    RunListing(String),

    /// Opening the push stream failed
    #[error("Failed to subscribe to run {run_id}: {message}")]
    Subscribe { run_id: String, message: String },
}

impl MonitorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RunNotFound(_))
    }
}
