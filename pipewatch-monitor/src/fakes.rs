//! In-memory collaborators for tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pipewatch_core::{JobRecord, JobStatus, JobType, RunSummary, StreamMessage};

use crate::source::{JobStream, RunSource, StreamFault, StreamSource};

pub type Script = Vec<Result<StreamMessage, StreamFault>>;

pub fn summary(run_id: &str, job_type: JobType, status: JobStatus) -> RunSummary {
    RunSummary::new(JobRecord::new(format!("job-{}", run_id), run_id, job_type, status))
}

/// Backend double: serves a run list and scripted streams, and records the
/// order in which subscriptions are opened and closed.
#[derive(Default)]
pub struct FakeBackend {
    runs: Mutex<Vec<RunSummary>>,
    scripts: Mutex<HashMap<String, Script>>,
    pub active: Arc<AtomicUsize>,
    pub log: Arc<Mutex<Vec<String>>>,
    pub list_calls: AtomicUsize,
    pub fail_listing: Mutex<bool>,
}

impl FakeBackend {
    pub fn new(runs: Vec<RunSummary>) -> Arc<Self> {
        Arc::new(Self {
            runs: Mutex::new(runs),
            ..Default::default()
        })
    }

    pub fn script(&self, run_id: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(run_id.to_string(), script);
    }

    pub fn set_runs(&self, runs: Vec<RunSummary>) {
        *self.runs.lock().unwrap() = runs;
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunSource for FakeBackend {
    async fn list_runs(&self) -> anyhow::Result<Vec<RunSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_listing.lock().unwrap() {
            anyhow::bail!("listing unavailable");
        }
        Ok(self.runs.lock().unwrap().clone())
    }
}

#[async_trait]
impl StreamSource for FakeBackend {
    async fn subscribe(&self, run_id: &str) -> anyhow::Result<Box<dyn JobStream>> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .remove(run_id)
            .ok_or_else(|| anyhow::anyhow!("no stream for run {}", run_id))?;

        self.active.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("open:{}", run_id));

        Ok(Box::new(FakeStream {
            run_id: run_id.to_string(),
            items: script.into(),
            active: Arc::clone(&self.active),
            log: Arc::clone(&self.log),
            closed: false,
        }))
    }
}

pub struct FakeStream {
    run_id: String,
    items: VecDeque<Result<StreamMessage, StreamFault>>,
    active: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<String>>>,
    closed: bool,
}

#[async_trait]
impl JobStream for FakeStream {
    async fn next_message(&mut self) -> Option<Result<StreamMessage, StreamFault>> {
        if self.closed {
            return None;
        }
        self.items.pop_front()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("close:{}", self.run_id));
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.close();
    }
}
