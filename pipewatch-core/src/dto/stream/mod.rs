//! Push stream message shapes
//!
//! Each stream message carries one JSON payload. Two shapes are recognized:
//! an array of job records, or an object signalling the end of the stream
//! (`{"done": true}`) or a producer-side error (`{"error": "..."}`).

use serde::Deserialize;
use thiserror::Error;

use crate::domain::job::JobRecord;

/// Decoded push stream message
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Snapshot batch for the run, oldest first
    Records(Vec<JobRecord>),
    /// The producer finished the run
    Done,
    /// The producer reported an error and will send nothing else
    Error(String),
}

/// Wire representation, before normalization
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessage {
    Records(Vec<JobRecord>),
    Control {
        #[serde(default)]
        done: bool,
        #[serde(default)]
        error: Option<String>,
    },
}

/// Errors decoding a stream payload
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not JSON, or JSON of neither recognized shape
    #[error("invalid stream payload: {0}")]
    Json(#[from] serde_json::Error),

    /// An object carrying neither `done: true` nor `error`
    #[error("stream object carries neither 'done' nor 'error'")]
    UnknownControl,
}

impl StreamMessage {
    /// Decodes one message payload
    ///
    /// An `error` field wins over `done` when both are present.
    pub fn parse(payload: &str) -> Result<Self, DecodeError> {
        let raw: RawMessage = serde_json::from_str(payload)?;

        match raw {
            RawMessage::Records(records) => Ok(StreamMessage::Records(records)),
            RawMessage::Control {
                error: Some(error), ..
            } => Ok(StreamMessage::Error(error)),
            RawMessage::Control { done: true, .. } => Ok(StreamMessage::Done),
            RawMessage::Control { .. } => Err(DecodeError::UnknownControl),
        }
    }

    /// The most recent record of a batch, if any
    pub fn latest(&self) -> Option<&JobRecord> {
        match self {
            StreamMessage::Records(records) => records.last(),
            _ => None,
        }
    }
}
