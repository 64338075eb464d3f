//! Live job channel
//!
//! Follows one run. A channel starts `Idle`, moves to `Streaming` when it opens
//! a push stream for an active run, and ends `Closed`. A run that is already
//! finished never gets a stream: its last known record is resolved once and the
//! channel closes right away.
//!
//! Closed is terminal. There is no reconnection; after a transport error the
//! last derived view simply stays as it was.

use pipewatch_core::graph::DEFAULT_NODE_SPACING;
use pipewatch_core::{GraphBuilder, JobRecord, JobView, RunSummary, StreamMessage};
use tracing::{debug, info, warn};

use crate::error::{MonitorError, Result};
use crate::source::{JobStream, StreamFault, StreamSource};

/// Lifecycle state of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Streaming,
    Closed,
}

/// Outcome of processing one stream message
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A new record was resolved
    Update(JobView),
    /// The producer finished the run; the channel is closed
    Done,
    /// The stream failed or reported an error; the channel is closed
    Error(String),
}

/// Subscription handle for one run
pub struct LiveJobChannel {
    run_id: String,
    builder: GraphBuilder,
    state: ChannelState,
    stream: Option<Box<dyn JobStream>>,
    last_view: JobView,
}

impl LiveJobChannel {
    /// Creates an idle channel seeded with the run's last known record
    pub fn new(run: &RunSummary) -> Self {
        Self::with_spacing(run, DEFAULT_NODE_SPACING)
    }

    pub fn with_spacing(run: &RunSummary, spacing: f64) -> Self {
        let builder = GraphBuilder::new(run.job_type()).with_spacing(spacing);
        let last_view = JobView::derive(run.record.clone(), &builder);

        Self {
            run_id: run.run_id().to_string(),
            builder,
            state: ChannelState::Idle,
            stream: None,
            last_view,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == ChannelState::Streaming
    }

    /// Most recent derivation; frozen once the channel is closed
    pub fn last_view(&self) -> &JobView {
        &self.last_view
    }

    /// Opens the channel
    ///
    /// Subscribes when the run is still pending or running. A finished run is
    /// not subscribed to and the channel closes immediately. Either way the
    /// view of the last known record is returned. Only an idle channel opens;
    /// other states return the current view unchanged.
    pub async fn open(&mut self, source: &dyn StreamSource) -> Result<JobView> {
        if self.state != ChannelState::Idle {
            return Ok(self.last_view.clone());
        }

        let status = self.last_view.record.status;
        if status.is_terminal() {
            info!(run_id = %self.run_id, %status, "Run already finished, not subscribing");
            self.state = ChannelState::Closed;
            return Ok(self.last_view.clone());
        }

        match source.subscribe(&self.run_id).await {
            Ok(stream) => {
                info!(run_id = %self.run_id, "Streaming run updates");
                self.stream = Some(stream);
                self.state = ChannelState::Streaming;
                Ok(self.last_view.clone())
            }
            Err(e) => {
                warn!(run_id = %self.run_id, "Failed to subscribe: {:#}", e);
                self.state = ChannelState::Closed;
                Err(MonitorError::Subscribe {
                    run_id: self.run_id.clone(),
                    message: format!("{:#}", e),
                })
            }
        }
    }

    /// Processes the next stream message
    ///
    /// Malformed messages, empty batches and records of other runs are skipped.
    /// Returns `None` once the channel is not streaming.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            if self.state != ChannelState::Streaming {
                return None;
            }
            let stream = self.stream.as_mut()?;

            match stream.next_message().await {
                Some(Ok(StreamMessage::Records(records))) => {
                    if let Some(view) = self.apply(records) {
                        return Some(ChannelEvent::Update(view));
                    }
                }
                Some(Ok(StreamMessage::Done)) => {
                    info!(run_id = %self.run_id, "Run stream reported completion");
                    self.close();
                    return Some(ChannelEvent::Done);
                }
                Some(Ok(StreamMessage::Error(message))) => {
                    warn!(run_id = %self.run_id, "Run stream reported an error: {}", message);
                    self.close();
                    return Some(ChannelEvent::Error(message));
                }
                Some(Err(StreamFault::Malformed(message))) => {
                    warn!(run_id = %self.run_id, "Skipping malformed message: {}", message);
                }
                Some(Err(StreamFault::Transport(message))) => {
                    warn!(run_id = %self.run_id, "Run stream failed: {}", message);
                    self.close();
                    return Some(ChannelEvent::Error(message));
                }
                None => {
                    warn!(run_id = %self.run_id, "Run stream ended without completion");
                    self.close();
                    return Some(ChannelEvent::Error("stream closed by server".to_string()));
                }
            }
        }
    }

    /// Resolves the latest record of this run in a batch
    fn apply(&mut self, records: Vec<JobRecord>) -> Option<JobView> {
        if records.is_empty() {
            debug!(run_id = %self.run_id, "Empty record batch");
            return None;
        }

        let mut latest = None;
        for record in records {
            if record.run_id == self.run_id {
                latest = Some(record);
            } else {
                warn!(
                    run_id = %self.run_id,
                    other = %record.run_id,
                    "Ignoring record of another run"
                );
            }
        }
        let record = latest?;

        let view = JobView::derive(record, &self.builder);
        debug!(
            run_id = %self.run_id,
            status = %view.record.status,
            step = ?view.active_step().map(|s| s.key.as_str()),
            "Resolved run update"
        );
        self.last_view = view.clone();
        Some(view)
    }

    /// Closes the subscription, if any; idempotent
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!(run_id = %self.run_id, "Closing run subscription");
            stream.close();
        }
        self.state = ChannelState::Closed;
    }
}

impl Drop for LiveJobChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for LiveJobChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveJobChannel")
            .field("run_id", &self.run_id)
            .field("state", &self.state)
            .field("subscribed", &self.stream.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeBackend, summary};
    use pipewatch_core::{JobResult, JobStatus, JobType, StepStatus, resolve};

    fn running(run_id: &str, step: &str, progress: u32) -> JobRecord {
        JobRecord::new("job", run_id, JobType::Enrichment, JobStatus::Running)
            .with_current_step(step)
            .with_progress(progress)
    }

    #[tokio::test]
    async fn test_finished_run_is_not_subscribed() {
        let mut run = summary("done-run", JobType::Extraction, JobStatus::Completed);
        run.record.result = Some(JobResult::default().with_counter("tables", 10));
        let backend = FakeBackend::new(vec![run.clone()]);

        let mut channel = LiveJobChannel::new(&run);
        let view = channel.open(backend.as_ref()).await.unwrap();

        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(backend.log().is_empty());
        assert_eq!(view.steps, resolve(JobType::Extraction, &run.record));
        assert_eq!(view.steps[3].subtitle, "10 tables");
        assert!(channel.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_run_is_not_subscribed() {
        let mut run = summary("bad-run", JobType::Extraction, JobStatus::Failed);
        run.record.error_message = Some("conn refused".to_string());
        let backend = FakeBackend::new(vec![run.clone()]);

        let mut channel = LiveJobChannel::new(&run);
        let view = channel.open(backend.as_ref()).await.unwrap();

        assert_eq!(backend.active(), 0);
        assert_eq!(view.steps[0].status, StepStatus::Failed);
        assert_eq!(view.steps[0].subtitle, "conn refused");
    }

    #[tokio::test]
    async fn test_stream_updates_until_done() {
        let run = summary("r1", JobType::Enrichment, JobStatus::Running);
        let backend = FakeBackend::new(vec![run.clone()]);
        backend.script(
            "r1",
            vec![
                Ok(StreamMessage::Records(vec![running("r1", "fetch_tables", 10)])),
                Ok(StreamMessage::Records(vec![
                    running("r1", "llm_batch_1", 20),
                    running("r1", "llm_batch_2", 45),
                ])),
                Ok(StreamMessage::Done),
            ],
        );

        let mut channel = LiveJobChannel::new(&run);
        channel.open(backend.as_ref()).await.unwrap();
        assert_eq!(channel.state(), ChannelState::Streaming);
        assert_eq!(backend.active(), 1);

        let Some(ChannelEvent::Update(first)) = channel.next_event().await else {
            panic!("expected update");
        };
        assert_eq!(first.active_step().unwrap().key, "fetch_tables");

        let Some(ChannelEvent::Update(second)) = channel.next_event().await else {
            panic!("expected update");
        };
        let batch = second.active_step().unwrap();
        assert_eq!(batch.subtitle, "Batch 2");
        assert_eq!(batch.progress, Some(45));
        assert_eq!(second.graph.animated_edges().count(), 1);

        assert_eq!(channel.next_event().await, Some(ChannelEvent::Done));
        assert_eq!(channel.state(), ChannelState::Closed);
        assert_eq!(backend.active(), 0);
        assert!(channel.next_event().await.is_none());
        assert_eq!(channel.last_view(), &second);
    }

    #[tokio::test]
    async fn test_transport_error_freezes_last_view() {
        let run = summary("r2", JobType::Enrichment, JobStatus::Running);
        let backend = FakeBackend::new(vec![run.clone()]);
        backend.script(
            "r2",
            vec![
                Ok(StreamMessage::Records(vec![running("r2", "generate_kpis", 70)])),
                Err(StreamFault::Transport("connection reset".to_string())),
                Ok(StreamMessage::Records(vec![running("r2", "done", 100)])),
            ],
        );

        let mut channel = LiveJobChannel::new(&run);
        channel.open(backend.as_ref()).await.unwrap();

        let Some(ChannelEvent::Update(view)) = channel.next_event().await else {
            panic!("expected update");
        };
        assert_eq!(
            channel.next_event().await,
            Some(ChannelEvent::Error("connection reset".to_string()))
        );
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(channel.next_event().await.is_none());
        assert_eq!(channel.last_view(), &view);
        assert_eq!(backend.active(), 0);
    }

    #[tokio::test]
    async fn test_producer_error_closes_channel() {
        let run = summary("r3", JobType::Extraction, JobStatus::Pending);
        let backend = FakeBackend::new(vec![run.clone()]);
        backend.script("r3", vec![Ok(StreamMessage::Error("run vanished".to_string()))]);

        let mut channel = LiveJobChannel::new(&run);
        channel.open(backend.as_ref()).await.unwrap();

        assert_eq!(
            channel.next_event().await,
            Some(ChannelEvent::Error("run vanished".to_string()))
        );
        assert_eq!(backend.log(), vec!["open:r3", "close:r3"]);
    }

    #[tokio::test]
    async fn test_skips_malformed_empty_and_foreign_messages() {
        let run = summary("r4", JobType::Enrichment, JobStatus::Running);
        let backend = FakeBackend::new(vec![run.clone()]);
        backend.script(
            "r4",
            vec![
                Err(StreamFault::Malformed("expected value".to_string())),
                Ok(StreamMessage::Records(vec![])),
                Ok(StreamMessage::Records(vec![running("other", "done", 1)])),
                Ok(StreamMessage::Records(vec![running("r4", "save_descriptions", 5)])),
            ],
        );

        let mut channel = LiveJobChannel::new(&run);
        channel.open(backend.as_ref()).await.unwrap();

        let Some(ChannelEvent::Update(view)) = channel.next_event().await else {
            panic!("expected update");
        };
        assert_eq!(view.record.run_id, "r4");
        assert_eq!(view.active_step().unwrap().key, "save_descriptions");
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_own_latest_record() {
        let run = summary("r", JobType::Enrichment, JobStatus::Running);
        let backend = FakeBackend::new(vec![run.clone()]);
        backend.script(
            "r",
            vec![
                Ok(StreamMessage::Records(vec![
                    running("r", "fetch_tables", 10),
                    running("r", "generate_kpis", 70),
                    running("x", "start", 0),
                ])),
                Ok(StreamMessage::Done),
            ],
        );

        let mut channel = LiveJobChannel::new(&run);
        channel.open(backend.as_ref()).await.unwrap();

        let Some(ChannelEvent::Update(view)) = channel.next_event().await else {
            panic!("expected update");
        };
        assert_eq!(view.record.run_id, "r");
        assert_eq!(view.active_step().unwrap().key, "generate_kpis");
        assert_eq!(channel.next_event().await, Some(ChannelEvent::Done));
    }

    #[tokio::test]
    async fn test_stream_end_without_done_is_an_error() {
        let run = summary("r5", JobType::Extraction, JobStatus::Running);
        let backend = FakeBackend::new(vec![run.clone()]);
        backend.script("r5", vec![]);

        let mut channel = LiveJobChannel::new(&run);
        channel.open(backend.as_ref()).await.unwrap();

        assert!(matches!(
            channel.next_event().await,
            Some(ChannelEvent::Error(_))
        ));
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_subscribe_failure_closes_channel() {
        let run = summary("r6", JobType::Extraction, JobStatus::Running);
        let backend = FakeBackend::new(vec![run.clone()]);

        let mut channel = LiveJobChannel::new(&run);
        let err = channel.open(backend.as_ref()).await.unwrap_err();

        assert!(matches!(err, MonitorError::Subscribe { .. }));
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_close_and_drop_release_subscription() {
        let run = summary("r7", JobType::Extraction, JobStatus::Running);
        let backend = FakeBackend::new(vec![run.clone()]);
        backend.script("r7", vec![]);
        backend.script("r8", vec![]);

        let mut channel = LiveJobChannel::new(&run);
        channel.open(backend.as_ref()).await.unwrap();
        channel.close();
        channel.close();
        assert_eq!(backend.active(), 0);
        assert_eq!(backend.log(), vec!["open:r7", "close:r7"]);

        // reopening a closed channel is a no-op
        channel.open(backend.as_ref()).await.unwrap();
        assert_eq!(backend.active(), 0);

        let other = summary("r8", JobType::Extraction, JobStatus::Running);
        {
            let mut channel = LiveJobChannel::new(&other);
            channel.open(backend.as_ref()).await.unwrap();
            assert_eq!(backend.active(), 1);
        }
        assert_eq!(backend.active(), 0);
    }

    #[tokio::test]
    async fn test_identical_records_yield_identical_views() {
        let run = summary("r9", JobType::Enrichment, JobStatus::Running);
        let backend = FakeBackend::new(vec![run.clone()]);
        let record = running("r9", "llm_batch_3", 50);
        backend.script(
            "r9",
            vec![
                Ok(StreamMessage::Records(vec![record.clone()])),
                Ok(StreamMessage::Records(vec![record])),
            ],
        );

        let mut channel = LiveJobChannel::new(&run);
        channel.open(backend.as_ref()).await.unwrap();

        let first = channel.next_event().await;
        let second = channel.next_event().await;
        assert!(matches!(first, Some(ChannelEvent::Update(_))));
        assert_eq!(first, second);
    }
}
