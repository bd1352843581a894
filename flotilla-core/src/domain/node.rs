//! Orchestration node domain types
//!
//! A node is one deployment target plus the two actions that run after the
//! target is deployed: pushing the shared artifact and invoking the execution
//! monitor for the target's job.

use serde::{Deserialize, Serialize};

use crate::domain::asset::SharedAssetLocation;

/// Run order occupied by the deployment of the node's target
pub const DEPLOY_RUN_ORDER: u32 = 1;

/// Run-order increment applied to `invokeMonitor` relative to `pushArtifact`
pub const MONITOR_RUN_ORDER_INCREMENT: u32 = 1;

/// Reference to an environment-specific deployment stage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    /// Logical environment name (e.g. "dev", "qa")
    pub environment: String,
    /// Identifier of the deployment stage; doubles as the node id
    pub stage_id: String,
}

impl TargetRef {
    pub fn new(environment: impl Into<String>, stage_id: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            stage_id: stage_id.into(),
        }
    }

    /// Target whose stage id is derived from the environment name
    pub fn for_environment(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let stage_id = format!("{}-Stage", environment);
        Self {
            environment,
            stage_id,
        }
    }
}

/// Post-deployment action attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PostAction {
    /// Upload the shared artifact to `<bucket>/<jobName>/source.zip`
    PushArtifact {
        run_order: u32,
        bucket: String,
        key: String,
    },
    /// Run the execution monitor against the node's job
    InvokeMonitor {
        run_order: u32,
        monitor: String,
        job_name: String,
    },
}

impl PostAction {
    pub fn run_order(&self) -> u32 {
        match self {
            PostAction::PushArtifact { run_order, .. } => *run_order,
            PostAction::InvokeMonitor { run_order, .. } => *run_order,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PostAction::PushArtifact { .. } => "pushArtifact",
            PostAction::InvokeMonitor { .. } => "invokeMonitor",
        }
    }
}

/// Where a sub-pipeline picks up its source artifact
///
/// The sub-pipeline resolves the bucket through `parameter_name` and never
/// triggers on artifact changes: its execution is started by the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubPipelineSource {
    pub parameter_name: String,
    pub key: String,
    pub trigger_on_change: bool,
}

/// One deployment target and its post-deployment actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationNode {
    pub id: String,
    pub target: TargetRef,
    pub job_name: String,
    pub source: SubPipelineSource,
    /// Always `[pushArtifact, invokeMonitor]`
    pub post_actions: Vec<PostAction>,
}

impl OrchestrationNode {
    /// Build a node and derive its post actions
    pub fn new(
        target: TargetRef,
        job_name: impl Into<String>,
        location: &SharedAssetLocation,
        monitor: &str,
    ) -> Self {
        let job_name = job_name.into();
        let key = SharedAssetLocation::object_key(&job_name);
        let push_order = DEPLOY_RUN_ORDER + 1;

        let post_actions = vec![
            PostAction::PushArtifact {
                run_order: push_order,
                bucket: location.bucket.clone(),
                key: key.clone(),
            },
            PostAction::InvokeMonitor {
                run_order: push_order + MONITOR_RUN_ORDER_INCREMENT,
                monitor: monitor.to_string(),
                job_name: job_name.clone(),
            },
        ];

        Self {
            id: target.stage_id.clone(),
            source: SubPipelineSource {
                parameter_name: location.parameter_name.clone(),
                key,
                trigger_on_change: false,
            },
            target,
            job_name,
            post_actions,
        }
    }

    /// Post actions sorted by run order
    pub fn scheduled_actions(&self) -> Vec<&PostAction> {
        let mut actions: Vec<&PostAction> = self.post_actions.iter().collect();
        actions.sort_by_key(|action| action.run_order());
        actions
    }
}
