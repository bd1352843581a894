//! Job domain types

use serde::{Deserialize, Serialize};

/// Opaque handle assigned by the job service when an execution starts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a remote job execution
///
/// The job service reports statuses as free-form strings. Values outside the
/// known set are kept verbatim in `Other` so the last observed status can be
/// reported back to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    NotStarted,
    InProgress,
    Succeeded,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::NotStarted => "NotStarted",
            JobStatus::InProgress => "InProgress",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
            JobStatus::Other(status) => status,
        }
    }
}

impl From<String> for JobStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "NotStarted" => JobStatus::NotStarted,
            "InProgress" => JobStatus::InProgress,
            "Succeeded" => JobStatus::Succeeded,
            "Failed" => JobStatus::Failed,
            _ => JobStatus::Other(status),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(status: &str) -> Self {
        JobStatus::from(status.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(status) => status,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named remote execution unit
///
/// Created when a monitor starts the job; the status only changes through
/// polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    pub execution_id: Option<ExecutionId>,
    pub status: JobStatus,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            execution_id: None,
            status: JobStatus::NotStarted,
        }
    }

    /// Record the handle returned by the job service
    pub fn record_start(&mut self, execution_id: ExecutionId) {
        self.execution_id = Some(execution_id);
    }

    /// Record a polled status
    pub fn observe(&mut self, status: JobStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(JobStatus::from("InProgress"), JobStatus::InProgress);
        assert_eq!(JobStatus::from("Succeeded"), JobStatus::Succeeded);
        assert_eq!(
            JobStatus::from("Stopped"),
            JobStatus::Other("Stopped".to_string())
        );
    }

    #[test]
    fn test_unknown_status_survives_serialization() {
        let json = serde_json::to_string(&JobStatus::Other("Stopping".to_string())).unwrap();
        assert_eq!(json, "\"Stopping\"");

        let status: JobStatus = serde_json::from_str("\"InProgress\"").unwrap();
        assert_eq!(status, JobStatus::InProgress);
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = Job::new("qa-pipeline");
        assert_eq!(job.status, JobStatus::NotStarted);
        assert!(job.execution_id.is_none());

        job.record_start(ExecutionId::new("exec-1"));
        job.observe(JobStatus::InProgress);

        assert_eq!(job.execution_id.as_ref().map(|id| id.as_str()), Some("exec-1"));
        assert_eq!(job.status, JobStatus::InProgress);
    }
}
