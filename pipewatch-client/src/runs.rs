//! Run listing endpoints

use pipewatch_core::RunSummary;
use tracing::debug;

use crate::PipelineClient;
use crate::error::Result;

impl PipelineClient {
    /// List all runs, most recent first as ordered by the backend
    ///
    /// # Returns
    /// The last known record of every run
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let url = self.endpoint(&["api", "runs"])?;
        let response = self.timed(self.client.get(url)).send().await?;

        let runs: Vec<RunSummary> = self.handle_response(response).await?;
        debug!("Fetched {} run(s)", runs.len());
        Ok(runs)
    }

    /// Get a single run by its run id
    ///
    /// # Arguments
    /// * `run_id` - The run identifier
    ///
    /// # Returns
    /// The last known record of the run
    pub async fn get_run(&self, run_id: &str) -> Result<RunSummary> {
        let url = self.endpoint(&["api", "runs", run_id])?;
        let response = self.timed(self.client.get(url)).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use crate::test_server::serve_once;
    use pipewatch_core::{JobStatus, JobType};

    #[tokio::test]
    async fn test_list_runs_parses_listing() {
        let body = r#"[
            {"id":"j1","runId":"r1","jobType":"extraction","status":"completed",
             "result":{"tables":10},"createdAt":"2024-05-01T10:00:00Z"},
            {"id":2,"run_id":"r2","job_type":"enrichment","status":"running",
             "current_step":"llm_batch_3","progress":40}
        ]"#;
        let (base_url, request) = serve_once("200 OK", "application/json", body).await;

        let runs = PipelineClient::new(base_url).list_runs().await.unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id(), "r1");
        assert_eq!(runs[0].status(), JobStatus::Completed);
        assert!(runs[0].created_at.is_some());
        assert_eq!(runs[1].record.id, "2");
        assert_eq!(runs[1].job_type(), JobType::Enrichment);
        assert_eq!(runs[1].record.current_step.as_deref(), Some("llm_batch_3"));
        assert!(request.await.unwrap().starts_with("get /api/runs http/1.1"));
    }

    #[tokio::test]
    async fn test_get_run_maps_not_found() {
        let (base_url, request) = serve_once("404 Not Found", "text/plain", "run not found").await;

        let err = PipelineClient::new(base_url).get_run("r9").await.unwrap_err();

        assert!(err.is_not_found());
        match err {
            ClientError::ApiError { message, .. } => assert_eq!(message, "run not found"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(request.await.unwrap().starts_with("get /api/runs/r9 http/1.1"));
    }

    #[tokio::test]
    async fn test_list_runs_rejects_invalid_json() {
        let (base_url, _request) = serve_once("200 OK", "application/json", "not json").await;

        let err = PipelineClient::new(base_url).list_runs().await.unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)));
    }
}
