//! Pipewatch HTTP Client
//!
//! A small, type-safe HTTP client for the pipeline backend: listing runs and
//! subscribing to the push stream of a run.
//!
//! # Example
//!
//! ```no_run
//! use pipewatch_client::PipelineClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PipelineClient::new("http://localhost:8000");
//!
//!     for run in client.list_runs().await? {
//!         println!("{} {} {}", run.run_id(), run.job_type(), run.status());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod runs;
pub mod sse;
mod stream;

#[cfg(test)]
mod test_server;

pub use error::{ClientError, Result};
pub use stream::RunEventStream;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the pipeline backend
///
/// Plain requests honour the optional request timeout. Stream subscriptions
/// never time out on their own; they stay open until the server ends them or
/// the caller drops the stream.
#[derive(Debug, Clone)]
pub struct PipelineClient {
    /// Base URL of the backend (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Timeout applied to non-streaming requests
    request_timeout: Option<Duration>,
}

impl PipelineClient {
    /// Create a new pipeline client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend API (e.g., "http://localhost:8000")
    ///
    /// # Example
    /// ```
    /// use pipewatch_client::PipelineClient;
    ///
    /// let client = PipelineClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new pipeline client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. Do not set a
    /// global timeout on it if you subscribe to streams; use
    /// [`PipelineClient::with_request_timeout`] instead.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend API
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout: None,
        }
    }

    /// Set the timeout used for non-streaming requests
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an endpoint URL from path segments
    ///
    /// Segments are percent-encoded, so opaque ids containing reserved
    /// characters stay inside their segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("invalid base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!(
                    "base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Apply the request timeout, if any
    fn timed(&self, request: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Fail on a non-success status, keeping the body as the error message
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
