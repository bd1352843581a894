//! Deployment plan files
//!
//! A plan is the JSON description of a root pipeline and its waves:
//!
//! ```json
//! {
//!   "pipeline": { "id": "root", "source": { "repository": "org/infra", "branch": "main" },
//!                 "jobNames": { "dev": "dev-pipeline" } },
//!   "waves": [
//!     { "id": "pre-prod", "nodes": [ { "environment": "dev" },
//!                                    { "environment": "qa", "jobName": "qa-pipeline" } ] }
//!   ]
//! }
//! ```
//!
//! Nodes without a `jobName` resolve it from the pipeline's `jobNames`.

use anyhow::{Context, Result};
use flotilla_core::domain::node::TargetRef;
use flotilla_core::dto::graph::AssembledPipeline;
use flotilla_core::{PipelineBuilder, PipelineProps};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
    pub pipeline: PipelineProps,
    #[serde(default)]
    pub waves: Vec<PlanWave>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWave {
    pub id: String,
    #[serde(default)]
    pub nodes: Vec<PlanNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanNode {
    pub environment: String,
    /// Defaults to `<environment>-Stage`
    #[serde(default)]
    pub stage_id: Option<String>,
    #[serde(default)]
    pub job_name: Option<String>,
}

impl PlanNode {
    fn target(&self) -> TargetRef {
        match &self.stage_id {
            Some(stage_id) => TargetRef::new(self.environment.clone(), stage_id.clone()),
            None => TargetRef::for_environment(self.environment.clone()),
        }
    }
}

impl DeploymentPlan {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse plan file: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Register every wave and node, then finalize the builder once
    pub fn assemble(&self) -> Result<AssembledPipeline> {
        let builder = PipelineBuilder::new(self.pipeline.clone())?;

        for plan_wave in &self.waves {
            let wave = builder.add_wave(plan_wave.id.clone())?;
            for plan_node in &plan_wave.nodes {
                let node = match &plan_node.job_name {
                    Some(job_name) => wave.add_node(plan_node.target(), job_name.clone())?,
                    None => wave.add_environment(plan_node.target())?,
                };
                debug!("Registered node {} in wave {}", node.id, plan_wave.id);
            }
        }

        Ok(builder.finalize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_core::BuildError;

    const PLAN: &str = r#"{
        "pipeline": {
            "id": "Root",
            "source": { "repository": "org/infra", "branch": "main" },
            "jobNames": { "dev": "dev-pipeline", "prod": "prod-pipeline" }
        },
        "waves": [
            { "id": "pre-prod", "nodes": [
                { "environment": "dev" },
                { "environment": "qa", "stageId": "qa-eu-Stage", "jobName": "qa-pipeline" }
            ] },
            { "id": "prod", "nodes": [ { "environment": "prod" } ] }
        ]
    }"#;

    #[test]
    fn test_assemble_plan() {
        let pipeline = DeploymentPlan::from_json(PLAN).unwrap().assemble().unwrap();

        assert_eq!(pipeline.id, "Root");
        assert_eq!(pipeline.asset_location.bucket, "root-assets");
        assert_eq!(pipeline.asset_location.parameter_name, "/Root/AssetBucketArn");
        assert_eq!(pipeline.waves.len(), 2);

        let ids: Vec<&str> = pipeline.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["dev-Stage", "qa-eu-Stage", "prod-Stage"]);

        let jobs: Vec<&str> = pipeline.nodes().map(|n| n.job_name.as_str()).collect();
        assert_eq!(jobs, vec!["dev-pipeline", "qa-pipeline", "prod-pipeline"]);
    }

    #[test]
    fn test_unmapped_environment_is_rejected() {
        let plan = DeploymentPlan::from_json(
            r#"{
                "pipeline": { "id": "root", "source": { "repository": "r", "branch": "main" } },
                "waves": [ { "id": "w", "nodes": [ { "environment": "staging" } ] } ]
            }"#,
        )
        .unwrap();

        let err = plan.assemble().unwrap_err();
        let build_error = err.downcast_ref::<BuildError>().unwrap();
        assert!(build_error.is_configuration());
    }

    #[test]
    fn test_plan_without_source_is_rejected() {
        let plan = DeploymentPlan::from_json(r#"{ "pipeline": { "id": "root" } }"#).unwrap();
        assert!(plan.assemble().is_err());
    }

    #[test]
    fn test_plan_without_waves_assembles_empty_graph() {
        let plan = DeploymentPlan::from_json(
            r#"{ "pipeline": { "id": "root", "source": { "repository": "r", "branch": "main" } } }"#,
        )
        .unwrap();

        let pipeline = plan.assemble().unwrap();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.synth.name, "SynthStep");
    }
}
