//! Push stream subscription

use std::collections::VecDeque;

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use pipewatch_core::StreamMessage;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, info};

use crate::PipelineClient;
use crate::error::{ClientError, Result};
use crate::sse::SseDecoder;

impl PipelineClient {
    /// Subscribe to the push stream of a run
    ///
    /// # Arguments
    /// * `run_id` - The run to follow
    ///
    /// # Returns
    /// An open stream; dropping it closes the connection
    pub async fn subscribe(&self, run_id: &str) -> Result<RunEventStream> {
        let url = self.endpoint(&["api", "runs", run_id, "stream"])?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        info!(run_id, "Subscribed to run stream");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(RunEventStream::new(run_id, body))
    }
}

/// Open push stream of one run
///
/// Yields decoded messages in arrival order. A malformed message is reported
/// as [`ClientError::MalformedMessage`] and the stream stays usable; a
/// transport failure is reported once and ends the stream.
pub struct RunEventStream {
    run_id: String,
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl RunEventStream {
    fn new(run_id: &str, body: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> Self {
        Self {
            run_id: run_id.to_string(),
            body,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Next message, or `None` once the stream ended or was closed
    pub async fn next_message(&mut self) -> Option<Result<StreamMessage>> {
        loop {
            if let Some(payload) = self.pending.pop_front() {
                return Some(StreamMessage::parse(&payload).map_err(ClientError::from));
            }

            if self.finished {
                return None;
            }

            match self.body.next().await {
                Some(Ok(chunk)) => {
                    let events = self.decoder.feed(&chunk);
                    self.pending.extend(events);
                }
                Some(Err(e)) => {
                    self.finish();
                    return Some(Err(ClientError::StreamFailed(e.to_string())));
                }
                None => {
                    debug!(run_id = %self.run_id, "Run stream ended by server");
                    self.finish();
                    return None;
                }
            }
        }
    }

    /// Close the connection; later calls to `next_message` return `None`
    pub fn close(&mut self) {
        if !self.finished {
            debug!(run_id = %self.run_id, "Closing run stream");
        }
        self.finish();
        self.pending.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.finished && self.pending.is_empty()
    }

    fn finish(&mut self) {
        self.finished = true;
        self.body = stream::empty().boxed();
    }
}

impl std::fmt::Debug for RunEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunEventStream")
            .field("run_id", &self.run_id)
            .field("pending", &self.pending.len())
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve_once;

    fn stream_of(chunks: &[&str]) -> RunEventStream {
        let chunks: Vec<reqwest::Result<Vec<u8>>> =
            chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        RunEventStream::new("run-1", stream::iter(chunks).boxed())
    }

    #[tokio::test]
    async fn test_yields_messages_in_order() {
        let mut stream = stream_of(&[
            r#"data: [{"id":"1","runId":"run-1","jobType":"extraction","#,
            "\"status\":\"running\",\"currentStep\":\"start\"}]\n\n",
            "data: {\"done\": true}\n\n",
        ]);

        let first = stream.next_message().await.unwrap().unwrap();
        assert_eq!(
            first.latest().and_then(|r| r.current_step.as_deref()),
            Some("start")
        );
        assert_eq!(
            stream.next_message().await.unwrap().unwrap(),
            StreamMessage::Done
        );
        assert!(stream.next_message().await.is_none());
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn test_malformed_message_does_not_end_stream() {
        let mut stream = stream_of(&["data: nope\n\ndata: {\"error\": \"boom\"}\n\n"]);

        let err = stream.next_message().await.unwrap().unwrap_err();
        assert!(err.is_malformed_message());
        assert_eq!(
            stream.next_message().await.unwrap().unwrap(),
            StreamMessage::Error("boom".to_string())
        );
    }

    #[tokio::test]
    async fn test_subscribe_over_http() {
        let body = concat!(
            ": connected\n\n",
            "data: [{\"id\":\"1\",\"runId\":\"run-1\",\"jobType\":\"enrichment\",",
            "\"status\":\"running\",\"currentStep\":\"fetch_tables\"}]\n\n",
            "data: {\"done\": true}\n\n",
        );
        let (base_url, request) = serve_once("200 OK", "text/event-stream", body).await;

        let mut stream = PipelineClient::new(base_url).subscribe("run-1").await.unwrap();

        let first = stream.next_message().await.unwrap().unwrap();
        assert_eq!(
            first.latest().and_then(|r| r.current_step.as_deref()),
            Some("fetch_tables")
        );
        assert_eq!(
            stream.next_message().await.unwrap().unwrap(),
            StreamMessage::Done
        );
        assert!(stream.next_message().await.is_none());

        let request = request.await.unwrap();
        assert!(request.starts_with("get /api/runs/run-1/stream http/1.1"));
        assert!(request.contains("accept: text/event-stream"));
        assert!(request.contains("cache-control: no-cache"));
    }

    #[tokio::test]
    async fn test_subscribe_maps_server_error() {
        let (base_url, _request) = serve_once("503 Service Unavailable", "text/plain", "busy").await;

        let err = PipelineClient::new(base_url).subscribe("run-1").await.unwrap_err();
        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn test_close_discards_pending_messages() {
        let mut stream = stream_of(&["data: []\n\ndata: []\n\n"]);
        assert!(stream.next_message().await.is_some());

        stream.close();
        assert!(stream.is_closed());
        assert!(stream.next_message().await.is_none());
    }
}
