//! Scheduler layer for the runner
//!
//! Executes an assembled graph: waves in registration order, the nodes of a
//! wave concurrently, and for each node its deployment followed by its post
//! actions in run order.

pub mod executor;
pub mod report;

pub use executor::WaveExecutor;
pub use report::{DeploymentReport, NodeReport, WaveReport, WaveStatus};

use async_trait::async_trait;
use flotilla_core::domain::node::TargetRef;

/// Deploys the environment-specific stage behind a node
///
/// Provisioning the stage is the hosting system's concern; the executor only
/// needs to know when it has finished.
#[async_trait]
pub trait StageDeployer: Send + Sync {
    async fn deploy(&self, target: &TargetRef) -> anyhow::Result<()>;
}

/// Deployer for stages that are provisioned out of band
#[derive(Debug, Default, Clone, Copy)]
pub struct PreDeployedStages;

#[async_trait]
impl StageDeployer for PreDeployedStages {
    async fn deploy(&self, target: &TargetRef) -> anyhow::Result<()> {
        tracing::debug!(
            "Stage {} ({}) is provisioned externally",
            target.stage_id,
            target.environment
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Maximum nodes executing at once across the whole run
    pub max_parallel_nodes: usize,

    /// Start every wave immediately instead of after the previous one
    pub parallel_waves: bool,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_parallel_nodes: 4,
            parallel_waves: false,
        }
    }
}
