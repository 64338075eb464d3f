//! Configuration module
//!
//! Handles CLI configuration: backend URL, graph layout and request timeout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use pipewatch_client::PipelineClient;
use pipewatch_core::{GraphBuilder, JobType};
use pipewatch_monitor::RunListStore;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend API
    pub api_url: String,

    /// Horizontal distance between graph nodes
    pub node_spacing: f64,

    /// Timeout for non-streaming requests
    pub request_timeout: Duration,
}

impl Config {
    /// Rejects settings no command can work with
    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if url.is_empty() {
            bail!("API URL must not be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("API URL must start with http:// or https://, got '{}'", url);
        }
        if !self.node_spacing.is_finite() || self.node_spacing <= 0.0 {
            bail!("Node spacing must be a positive number, got {}", self.node_spacing);
        }
        if self.request_timeout.is_zero() {
            bail!("Request timeout must be at least one second");
        }
        Ok(())
    }

    pub fn client(&self) -> PipelineClient {
        PipelineClient::new(self.api_url.trim()).with_request_timeout(self.request_timeout)
    }

    /// Run list store backed by the HTTP client
    pub fn store(&self) -> RunListStore {
        let client = Arc::new(self.client());
        RunListStore::new(client.clone(), client).with_spacing(self.node_spacing)
    }

    pub fn graph_builder(&self, job_type: JobType) -> GraphBuilder {
        GraphBuilder::new(job_type).with_spacing(self.node_spacing)
    }
}
