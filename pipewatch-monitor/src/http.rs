//! Backend-backed collaborators
//!
//! Implements the monitor seams with the HTTP client.

use async_trait::async_trait;
use pipewatch_client::{PipelineClient, RunEventStream};
use pipewatch_core::{RunSummary, StreamMessage};

use crate::source::{JobStream, RunSource, StreamFault, StreamSource};

#[async_trait]
impl RunSource for PipelineClient {
    async fn list_runs(&self) -> anyhow::Result<Vec<RunSummary>> {
        Ok(PipelineClient::list_runs(self).await?)
    }
}

#[async_trait]
impl StreamSource for PipelineClient {
    async fn subscribe(&self, run_id: &str) -> anyhow::Result<Box<dyn JobStream>> {
        let stream = PipelineClient::subscribe(self, run_id).await?;
        Ok(Box::new(stream))
    }
}

#[async_trait]
impl JobStream for RunEventStream {
    async fn next_message(&mut self) -> Option<Result<StreamMessage, StreamFault>> {
        let item = RunEventStream::next_message(self).await?;
        Some(item.map_err(|e| {
            if e.is_malformed_message() {
                StreamFault::Malformed(e.to_string())
            } else {
                StreamFault::Transport(e.to_string())
            }
        }))
    }

    fn close(&mut self) {
        RunEventStream::close(self)
    }
}
