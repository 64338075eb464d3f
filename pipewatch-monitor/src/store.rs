//! Run list store
//!
//! Holds the run listing and the selected run, and decides which run feeds the
//! live channel. At most one channel exists per store; selecting another run
//! tears the old subscription down before the new one is opened.

use std::sync::Arc;

use pipewatch_core::graph::DEFAULT_NODE_SPACING;
use pipewatch_core::{JobView, RunSummary};
use tracing::{debug, info, warn};

use crate::channel::{ChannelEvent, ChannelState, LiveJobChannel};
use crate::error::{MonitorError, Result};
use crate::source::{RunSource, StreamSource};

/// Outcome of selecting a run
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The run is active and its stream is open
    Live(JobView),
    /// The run already finished; the view is final
    Finished(JobView),
}

impl Selection {
    pub fn view(&self) -> &JobView {
        match self {
            Self::Live(view) | Self::Finished(view) => view,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

pub struct RunListStore {
    runs_source: Arc<dyn RunSource>,
    stream_source: Arc<dyn StreamSource>,
    spacing: f64,
    runs: Vec<RunSummary>,
    selected: Option<String>,
    channel: Option<LiveJobChannel>,
}

impl RunListStore {
    pub fn new(runs_source: Arc<dyn RunSource>, stream_source: Arc<dyn StreamSource>) -> Self {
        Self {
            runs_source,
            stream_source,
            spacing: DEFAULT_NODE_SPACING,
            runs: Vec::new(),
            selected: None,
            channel: None,
        }
    }

    /// Horizontal distance between graph nodes of every derived view
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Fetches the run listing, replacing the current one
    pub async fn refresh(&mut self) -> Result<&[RunSummary]> {
        let runs = self
            .runs_source
            .list_runs()
            .await
            .map_err(|e| MonitorError::RunListing(format!("{:#}", e)))?;

        info!("Loaded {} run(s)", runs.len());
        self.runs = runs;
        Ok(&self.runs)
    }

    pub fn runs(&self) -> &[RunSummary] {
        &self.runs
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn find(&self, run_id: &str) -> Option<&RunSummary> {
        self.runs.iter().find(|run| run.run_id() == run_id)
    }

    /// Resolves a unique run id prefix to the full run id
    ///
    /// An exact match always wins over longer ids sharing the prefix.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<String> {
        if self.find(prefix).is_some() {
            return Ok(prefix.to_string());
        }

        let mut matches: Vec<String> = self
            .runs
            .iter()
            .map(|run| run.run_id())
            .filter(|id| id.starts_with(prefix))
            .map(str::to_string)
            .collect();

        match matches.len() {
            0 => Err(MonitorError::RunNotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(MonitorError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                matches,
            }),
        }
    }

    /// Selects a run and opens its channel
    ///
    /// Any previous channel is closed first. A finished run is resolved from
    /// its listed record without subscribing.
    pub async fn select(&mut self, run_id: &str) -> Result<Selection> {
        let run = self
            .find(run_id)
            .cloned()
            .ok_or_else(|| MonitorError::RunNotFound(run_id.to_string()))?;

        self.deselect();
        self.selected = Some(run_id.to_string());
        debug!(run_id, job_type = %run.job_type(), "Selected run");

        let mut channel = LiveJobChannel::with_spacing(&run, self.spacing);
        let opened = channel.open(self.stream_source.as_ref()).await;
        let streaming = channel.is_streaming();
        self.channel = Some(channel);

        let view = opened?;
        if streaming {
            Ok(Selection::Live(view))
        } else {
            Ok(Selection::Finished(view))
        }
    }

    /// Closes the channel and clears the selection
    pub fn deselect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        self.selected = None;
    }

    /// Drives the selected run's channel
    ///
    /// A `Done` event triggers one refresh of the run listing so the finished
    /// run shows its final status. Returns `None` when nothing is streaming.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        let event = self.channel.as_mut()?.next_event().await?;

        if event == ChannelEvent::Done {
            if let Err(e) = self.refresh().await {
                warn!("Failed to refresh runs after completion: {}", e);
            }
        }
        Some(event)
    }

    /// Latest derivation for the selected run
    pub fn current_view(&self) -> Option<&JobView> {
        self.channel.as_ref().map(LiveJobChannel::last_view)
    }

    pub fn channel_state(&self) -> Option<ChannelState> {
        self.channel.as_ref().map(LiveJobChannel::state)
    }
}

impl std::fmt::Debug for RunListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunListStore")
            .field("runs", &self.runs.len())
            .field("selected", &self.selected)
            .field("channel", &self.channel)
            .finish()
    }
}
