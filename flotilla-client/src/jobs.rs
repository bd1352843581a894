//! Job service interface and endpoints

use async_trait::async_trait;
use flotilla_core::domain::job::{ExecutionId, JobStatus};
use flotilla_core::dto::job::{ExecutionStatus, StartExecution};
use tracing::debug;

use crate::ServiceClient;
use crate::error::{ClientError, Result};

/// Starts named remote jobs and reports their status
///
/// The job definition must already exist remotely; implementations never
/// create it.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Start an execution of `job_name`
    ///
    /// Fails if the job does not exist or the caller lacks permission.
    async fn start(&self, job_name: &str) -> Result<ExecutionId>;

    /// Current status of an execution
    ///
    /// The execution id and job name are passed exactly as paired by `start`.
    async fn get_status(&self, execution_id: &ExecutionId, job_name: &str) -> Result<JobStatus>;
}

#[async_trait]
impl JobClient for ServiceClient {
    async fn start(&self, job_name: &str) -> Result<ExecutionId> {
        if job_name.is_empty() {
            return Err(ClientError::InvalidRequest(
                "job name must not be empty".to_string(),
            ));
        }

        let url = self.endpoint(["api", "jobs", job_name, "executions"])?;
        debug!("Starting job {} via {}", job_name, url);
        let response = self.client.post(url).send().await?;

        let started: StartExecution = self.handle_response(response).await?;
        Ok(started.execution_id)
    }

    async fn get_status(&self, execution_id: &ExecutionId, job_name: &str) -> Result<JobStatus> {
        let url = self.endpoint([
            "api",
            "jobs",
            job_name,
            "executions",
            execution_id.as_str(),
        ])?;
        let response = self.client.get(url).send().await?;

        let status: ExecutionStatus = self.handle_response(response).await?;
        debug!("Job {} execution {} is {}", job_name, execution_id, status.status);
        Ok(status.status)
    }
}
