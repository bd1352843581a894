//! Deployment reports

use chrono::{DateTime, Utc};
use flotilla_core::dto::monitor::MonitorOutcome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveStatus {
    Succeeded,
    Failed,
    /// Not started because an earlier wave failed
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    pub node_id: String,
    pub job_name: String,
    /// Present once the monitor ran to a terminal state
    pub outcome: Option<MonitorOutcome>,
    pub error: Option<String>,
}

impl NodeReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveReport {
    pub id: String,
    pub status: WaveStatus,
    pub nodes: Vec<NodeReport>,
}

impl WaveReport {
    pub fn skipped(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: WaveStatus::Skipped,
            nodes: Vec::new(),
        }
    }

    /// Report of a wave with one entry per node, run or aborted
    pub fn completed(id: impl Into<String>, nodes: Vec<NodeReport>) -> Self {
        let status = if nodes.iter().all(NodeReport::succeeded) {
            WaveStatus::Succeeded
        } else {
            WaveStatus::Failed
        };

        Self {
            id: id.into(),
            status,
            nodes,
        }
    }
}

/// Result of executing one assembled pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub run_id: Uuid,
    pub pipeline_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub waves: Vec<WaveReport>,
}

impl DeploymentReport {
    pub fn is_success(&self) -> bool {
        self.waves
            .iter()
            .all(|wave| wave.status == WaveStatus::Succeeded)
    }

    pub fn failed_nodes(&self) -> impl Iterator<Item = &NodeReport> {
        self.waves
            .iter()
            .flat_map(|wave| wave.nodes.iter())
            .filter(|node| !node.succeeded())
    }
}
