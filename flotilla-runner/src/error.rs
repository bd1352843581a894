//! Runtime error types
//!
//! A job reaching `Failed` is not an error of the monitor: it is reported
//! through `MonitorTerminal`. Only remote service failures end a monitor run
//! with `MonitorError`.

use flotilla_client::ClientError;
use flotilla_core::domain::job::{ExecutionId, JobStatus};
use thiserror::Error;

/// Remote service failure that ended a monitor run
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to start job '{job_name}': {source}")]
    Start {
        job_name: String,
        source: ClientError,
    },

    #[error("failed to read status of job '{job_name}' (execution {execution_id}): {source}")]
    Status {
        job_name: String,
        execution_id: ExecutionId,
        source: ClientError,
    },
}

impl MonitorError {
    /// Name of the job whose monitor run failed
    pub fn job_name(&self) -> &str {
        match self {
            MonitorError::Start { job_name, .. } | MonitorError::Status { job_name, .. } => job_name,
        }
    }
}

/// Failure of one node while executing a wave
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("node '{node_id}': deployment of stage failed: {reason}")]
    Deploy { node_id: String, reason: String },

    #[error("node '{node_id}': pushing artifact for job '{job_name}' failed: {source}")]
    Push {
        node_id: String,
        job_name: String,
        source: ClientError,
    },

    #[error("node '{node_id}': {source}")]
    Monitor {
        node_id: String,
        source: MonitorError,
    },

    #[error("node '{node_id}': job '{job_name}' ended {terminal} (last status: {last_status})")]
    JobFailed {
        node_id: String,
        job_name: String,
        terminal: &'static str,
        last_status: JobStatus,
    },

    #[error("node '{node_id}': task aborted: {reason}")]
    Aborted { node_id: String, reason: String },
}

impl ExecutorError {
    pub fn node_id(&self) -> &str {
        match self {
            ExecutorError::Deploy { node_id, .. }
            | ExecutorError::Push { node_id, .. }
            | ExecutorError::Monitor { node_id, .. }
            | ExecutorError::JobFailed { node_id, .. }
            | ExecutorError::Aborted { node_id, .. } => node_id,
        }
    }
}
