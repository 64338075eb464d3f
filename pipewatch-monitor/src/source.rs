//! Collaborator seams
//!
//! The monitor talks to the backend only through these traits: one for the
//! run listing, one for opening push streams, and the open stream itself.
//! [`crate::http`] implements them on top of `pipewatch-client`; tests use
//! in-memory fakes.

use async_trait::async_trait;
use pipewatch_core::{RunSummary, StreamMessage};
use thiserror::Error;

/// Source of the run listing
#[async_trait]
pub trait RunSource: Send + Sync {
    /// Fetches every run with its last known record
    async fn list_runs(&self) -> anyhow::Result<Vec<RunSummary>>;
}

/// Opens push stream subscriptions
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Opens one subscription for `run_id`
    async fn subscribe(&self, run_id: &str) -> anyhow::Result<Box<dyn JobStream>>;
}

/// Why a stream message could not be delivered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamFault {
    /// One message could not be decoded; the stream continues
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The connection failed; nothing else will arrive
    #[error("transport error: {0}")]
    Transport(String),
}

/// One open push stream subscription
#[async_trait]
pub trait JobStream: Send {
    /// Next message in arrival order, `None` once the stream ended
    async fn next_message(&mut self) -> Option<Result<StreamMessage, StreamFault>>;

    /// Releases the subscription; must be idempotent
    fn close(&mut self);
}
