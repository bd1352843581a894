//! Root pipeline builder

use std::rc::Rc;
use tracing::{debug, info};

use crate::builder::lifecycle::{Lifecycle, SharedLifecycle, WaveEntry};
use crate::builder::props::{JobNames, PipelineProps};
use crate::builder::wave::WaveRegistry;
use crate::domain::asset::SharedAssetLocation;
use crate::domain::build::BuildStep;
use crate::dto::graph::{AssembledPipeline, AssembledWave};
use crate::error::{BuildError, Result};

/// Name the execution monitor is registered under
pub const MONITOR_NAME: &str = "PipelineRunner";

/// Resources every wave registry is bound to
#[derive(Debug)]
pub(crate) struct WaveResources {
    pub location: SharedAssetLocation,
    pub monitor: String,
    pub job_names: JobNames,
}

/// Top-level registry of waves
///
/// Owns the shared artifact location and the monitor reference, hands out
/// `WaveRegistry` instances bound to them, and assembles the graph once.
///
/// # Example
/// ```
/// use flotilla_core::domain::build::CodeSource;
/// use flotilla_core::domain::node::TargetRef;
/// use flotilla_core::{JobNames, PipelineBuilder, PipelineProps};
///
/// let props = PipelineProps::new("root")
///     .with_source(CodeSource::new("acme/deployments", "main"))
///     .with_job_names(JobNames::new().with("qa", "qa-pipeline"));
/// let builder = PipelineBuilder::new(props)?;
///
/// let wave = builder.add_wave("qa-wave")?;
/// wave.add_environment(TargetRef::for_environment("qa"))?;
///
/// let graph = builder.finalize()?;
/// assert_eq!(graph.node_count(), 1);
/// assert!(builder.finalize().is_err());
/// # Ok::<(), flotilla_core::BuildError>(())
/// ```
#[derive(Debug)]
pub struct PipelineBuilder {
    id: String,
    synth: BuildStep,
    resources: Rc<WaveResources>,
    lifecycle: SharedLifecycle,
}

impl PipelineBuilder {
    /// Create a builder from its construction-time properties
    ///
    /// Fails with a configuration error when the id is blank or when neither a
    /// code source nor a build step is supplied.
    pub fn new(props: PipelineProps) -> Result<Self> {
        if props.id.trim().is_empty() {
            return Err(BuildError::configuration("pipeline id must not be empty"));
        }

        let synth = match (props.build_step, props.source) {
            (Some(step), _) => step,
            (None, Some(source)) => BuildStep::synth(source),
            (None, None) => {
                return Err(BuildError::configuration(format!(
                    "pipeline '{}': must specify either a code source or a build step",
                    props.id
                )));
            }
        };

        let parameter_name = props
            .parameter_name
            .unwrap_or_else(|| SharedAssetLocation::default_parameter_name(&props.id));
        let bucket = props
            .asset_bucket
            .unwrap_or_else(|| format!("{}-assets", props.id.to_lowercase()));

        debug!(
            "Pipeline '{}' uses asset bucket '{}' published as '{}'",
            props.id, bucket, parameter_name
        );

        Ok(Self {
            id: props.id,
            synth,
            resources: Rc::new(WaveResources {
                location: SharedAssetLocation::new(bucket, parameter_name),
                monitor: MONITOR_NAME.to_string(),
                job_names: props.job_names,
            }),
            lifecycle: Lifecycle::shared(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn synth(&self) -> &BuildStep {
        &self.synth
    }

    pub fn asset_location(&self) -> &SharedAssetLocation {
        &self.resources.location
    }

    pub fn monitor_name(&self) -> &str {
        &self.resources.monitor
    }

    pub fn is_finalized(&self) -> bool {
        self.lifecycle.borrow().is_finalized()
    }

    /// Register a new wave
    ///
    /// Waves execute in registration order.
    pub fn add_wave(&self, id: impl Into<String>) -> Result<WaveRegistry> {
        let id = id.into();
        let mut lifecycle = self.lifecycle.borrow_mut();
        let waves = lifecycle.open_waves("add_wave")?;

        if id.trim().is_empty() {
            return Err(BuildError::configuration("wave id must not be empty"));
        }
        if waves.iter().any(|wave| wave.id == id) {
            return Err(BuildError::DuplicateId { kind: "wave", id });
        }

        let index = waves.len();
        waves.push(WaveEntry::new(id.clone()));

        info!("Registered wave '{}' on pipeline '{}'", id, self.id);

        Ok(WaveRegistry::new(
            id,
            index,
            Rc::clone(&self.resources),
            Rc::clone(&self.lifecycle),
        ))
    }

    /// Freeze the registrations and assemble the graph
    ///
    /// Succeeds exactly once; a second call fails with `AlreadyFinalized`.
    pub fn finalize(&self) -> Result<AssembledPipeline> {
        let waves = self.lifecycle.borrow_mut().finalize()?;

        let waves: Vec<AssembledWave> = waves
            .into_iter()
            .map(|wave| AssembledWave {
                id: wave.id,
                nodes: wave.nodes,
            })
            .collect();

        let pipeline = AssembledPipeline {
            id: self.id.clone(),
            synth: self.synth.clone(),
            asset_location: self.resources.location.clone(),
            monitor: self.resources.monitor.clone(),
            waves,
        };

        info!(
            "Finalized pipeline '{}' with {} wave(s) and {} node(s)",
            self.id,
            pipeline.waves.len(),
            pipeline.node_count()
        );

        Ok(pipeline)
    }
}
