//! Monitor DTOs
//!
//! `MonitorInput` is the invocation payload (`{"jobName": "..."}`) and
//! `MonitorOutcome` is what a finished monitor run reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::job::{ExecutionId, JobStatus};
use crate::domain::node::{OrchestrationNode, PostAction};

/// Monitor invocation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorInput {
    pub job_name: String,
}

impl MonitorInput {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
        }
    }

    /// Payload of a node's `invokeMonitor` action
    pub fn for_node(node: &OrchestrationNode) -> Option<Self> {
        node.post_actions.iter().find_map(|action| match action {
            PostAction::InvokeMonitor { job_name, .. } => Some(Self::new(job_name.clone())),
            PostAction::PushArtifact { .. } => None,
        })
    }
}

/// Terminal state reached by a monitor run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MonitorTerminal {
    /// The job reported `Succeeded`
    Done,
    /// The job reported anything other than `InProgress` or `Succeeded`
    Failed { last_status: JobStatus },
    /// The polling budget ran out while the job was still in progress
    TimedOut { last_status: JobStatus },
}

impl MonitorTerminal {
    pub fn label(&self) -> &'static str {
        match self {
            MonitorTerminal::Done => "Done",
            MonitorTerminal::Failed { .. } => "Failed",
            MonitorTerminal::TimedOut { .. } => "TimedOut",
        }
    }
}

/// Report of a finished monitor run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorOutcome {
    pub job_name: String,
    pub execution_id: ExecutionId,
    pub terminal: MonitorTerminal,
    /// Number of status checks performed
    pub polls: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MonitorOutcome {
    pub fn is_success(&self) -> bool {
        self.terminal == MonitorTerminal::Done
    }

    /// Status observed on the last check
    pub fn last_status(&self) -> JobStatus {
        match &self.terminal {
            MonitorTerminal::Done => JobStatus::Succeeded,
            MonitorTerminal::Failed { last_status } | MonitorTerminal::TimedOut { last_status } => {
                last_status.clone()
            }
        }
    }
}
