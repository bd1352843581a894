//! Wave registry

use std::rc::Rc;
use tracing::debug;

use crate::builder::lifecycle::SharedLifecycle;
use crate::builder::pipeline::WaveResources;
use crate::domain::node::{OrchestrationNode, TargetRef};
use crate::error::{BuildError, Result};

/// A named group of nodes deployed with maximal parallelism
///
/// Created only through `PipelineBuilder::add_wave`. Nodes are append-only and
/// share the builder's lifecycle: once the builder is finalized, `add_node`
/// fails.
#[derive(Debug)]
pub struct WaveRegistry {
    id: String,
    index: usize,
    resources: Rc<WaveResources>,
    lifecycle: SharedLifecycle,
}

impl WaveRegistry {
    pub(crate) fn new(
        id: String,
        index: usize,
        resources: Rc<WaveResources>,
        lifecycle: SharedLifecycle,
    ) -> Self {
        Self {
            id,
            index,
            resources,
            lifecycle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register a deployment target whose post actions push the shared
    /// artifact and then monitor `job_name`
    ///
    /// Job names are unique across the whole pipeline since each one owns a
    /// key prefix in the shared bucket.
    pub fn add_node(
        &self,
        target: TargetRef,
        job_name: impl Into<String>,
    ) -> Result<OrchestrationNode> {
        let job_name = job_name.into();
        let mut lifecycle = self.lifecycle.borrow_mut();
        let waves = lifecycle.open_waves("add_node")?;

        if target.stage_id.trim().is_empty() {
            return Err(BuildError::configuration(format!(
                "wave '{}': target stage id must not be empty",
                self.id
            )));
        }
        if job_name.trim().is_empty() {
            return Err(BuildError::configuration(format!(
                "wave '{}': job name for '{}' must not be empty",
                self.id, target.stage_id
            )));
        }
        if waves
            .iter()
            .flat_map(|wave| wave.nodes.iter())
            .any(|node| node.job_name == job_name)
        {
            return Err(BuildError::DuplicateId {
                kind: "job",
                id: job_name,
            });
        }

        let wave = &mut waves[self.index];
        if wave.nodes.iter().any(|node| node.id == target.stage_id) {
            return Err(BuildError::DuplicateId {
                kind: "node",
                id: target.stage_id,
            });
        }

        let node = OrchestrationNode::new(
            target,
            job_name,
            &self.resources.location,
            &self.resources.monitor,
        );
        wave.nodes.push(node.clone());

        debug!(
            "Wave '{}': added node '{}' for job '{}'",
            self.id, node.id, node.job_name
        );

        Ok(node)
    }

    /// Register a target using the job name configured for its environment
    pub fn add_environment(&self, target: TargetRef) -> Result<OrchestrationNode> {
        if self.lifecycle.borrow().is_finalized() {
            return Err(BuildError::already_finalized("add_node"));
        }

        let job_name = self
            .resources
            .job_names
            .get(&target.environment)
            .ok_or_else(|| {
                BuildError::configuration(format!(
                    "no job name configured for environment '{}'",
                    target.environment
                ))
            })?
            .to_string();

        self.add_node(target, job_name)
    }
}
