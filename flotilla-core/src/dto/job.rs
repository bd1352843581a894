//! Job service DTOs
//!
//! The job name and execution id are passed verbatim between the start and
//! status calls.

use serde::{Deserialize, Serialize};

use crate::domain::job::{ExecutionId, JobStatus};

/// Response to starting a job execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExecution {
    pub execution_id: ExecutionId,
}

/// Response to a status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub status: JobStatus,
}
