//! Assembled orchestration graph
//!
//! Output of `PipelineBuilder::finalize`. Everything a runtime needs to execute
//! the deployment: the synth step, the shared artifact location, the monitor
//! name and the waves with their nodes in registration order.

use serde::{Deserialize, Serialize};

use crate::domain::asset::SharedAssetLocation;
use crate::domain::build::BuildStep;
use crate::domain::node::OrchestrationNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledPipeline {
    pub id: String,
    pub synth: BuildStep,
    pub asset_location: SharedAssetLocation,
    /// Name of the monitor every `invokeMonitor` action targets
    pub monitor: String,
    pub waves: Vec<AssembledWave>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledWave {
    pub id: String,
    pub nodes: Vec<OrchestrationNode>,
}

impl AssembledPipeline {
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.waves.iter().map(|wave| wave.nodes.len()).sum()
    }

    /// All nodes across waves, in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &OrchestrationNode> {
        self.waves.iter().flat_map(|wave| wave.nodes.iter())
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
