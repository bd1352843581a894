//! Wave executor
//!
//! Each node runs in its own task, gated by a semaphore shared by the whole
//! run. Within a node, the target is deployed first and the post actions
//! follow strictly in run order, so the artifact push always completes before
//! the monitor starts the job.

use chrono::Utc;
use flotilla_client::ArtifactStore;
use flotilla_core::domain::node::{OrchestrationNode, PostAction};
use flotilla_core::dto::graph::{AssembledPipeline, AssembledWave};
use flotilla_core::dto::monitor::{MonitorInput, MonitorOutcome};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::report::{DeploymentReport, NodeReport, WaveReport, WaveStatus};
use super::{ExecutorSettings, StageDeployer};
use crate::error::ExecutorError;
use crate::monitor::ExecutionMonitor;

/// Executes assembled pipelines against the deployer, artifact store and job
/// service
#[derive(Clone)]
pub struct WaveExecutor {
    deployer: Arc<dyn StageDeployer>,
    artifacts: Arc<dyn ArtifactStore>,
    monitor: ExecutionMonitor,
    settings: ExecutorSettings,
    semaphore: Arc<Semaphore>,
}

impl WaveExecutor {
    pub fn new(
        deployer: Arc<dyn StageDeployer>,
        artifacts: Arc<dyn ArtifactStore>,
        monitor: ExecutionMonitor,
        settings: ExecutorSettings,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(settings.max_parallel_nodes.max(1)));
        Self {
            deployer,
            artifacts,
            monitor,
            settings,
            semaphore,
        }
    }

    /// Execute every wave of `pipeline`, pushing `artifact` for each node
    ///
    /// In sequential mode a failed wave stops the run and later waves are
    /// reported as skipped.
    pub async fn execute(
        &self,
        pipeline: &AssembledPipeline,
        artifact: Arc<Vec<u8>>,
    ) -> DeploymentReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            "Executing pipeline {} (run {}): {} wave(s), {} node(s)",
            pipeline.id,
            run_id,
            pipeline.waves.len(),
            pipeline.node_count()
        );

        let waves = if self.settings.parallel_waves {
            self.execute_concurrently(pipeline, artifact).await
        } else {
            self.execute_in_order(pipeline, artifact).await
        };

        let report = DeploymentReport {
            run_id,
            pipeline_id: pipeline.id.clone(),
            started_at,
            finished_at: Utc::now(),
            waves,
        };

        if report.is_success() {
            info!("Pipeline {} (run {}) succeeded", pipeline.id, run_id);
        } else {
            error!(
                "Pipeline {} (run {}) failed: {} node(s) failed",
                pipeline.id,
                run_id,
                report.failed_nodes().count()
            );
        }

        report
    }

    async fn execute_in_order(
        &self,
        pipeline: &AssembledPipeline,
        artifact: Arc<Vec<u8>>,
    ) -> Vec<WaveReport> {
        let mut reports = Vec::with_capacity(pipeline.waves.len());
        let mut halted = false;

        for wave in &pipeline.waves {
            if halted {
                info!("Skipping wave {}", wave.id);
                reports.push(WaveReport::skipped(wave.id.clone()));
                continue;
            }

            let report = self.execute_wave(wave, Arc::clone(&artifact)).await;
            halted = report.status == WaveStatus::Failed;
            reports.push(report);
        }

        reports
    }

    async fn execute_concurrently(
        &self,
        pipeline: &AssembledPipeline,
        artifact: Arc<Vec<u8>>,
    ) -> Vec<WaveReport> {
        let handles: Vec<(String, JoinHandle<WaveReport>)> = pipeline
            .waves
            .iter()
            .map(|wave| {
                let executor = self.clone();
                let wave = wave.clone();
                let artifact = Arc::clone(&artifact);
                let id = wave.id.clone();
                let handle =
                    tokio::spawn(async move { executor.execute_wave(&wave, artifact).await });
                (id, handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!("Wave {} task panicked: {}", id, e);
                    reports.push(WaveReport {
                        id,
                        status: WaveStatus::Failed,
                        nodes: Vec::new(),
                    });
                }
            }
        }

        reports
    }

    /// Run all nodes of `wave` concurrently and wait for every one of them
    pub async fn execute_wave(&self, wave: &AssembledWave, artifact: Arc<Vec<u8>>) -> WaveReport {
        info!("Starting wave {} ({} node(s))", wave.id, wave.nodes.len());

        // A closed semaphore starts no further node; each one left is
        // reported as aborted.
        let mut tasks = Vec::with_capacity(wave.nodes.len());
        let mut closed: Option<String> = None;
        for node in &wave.nodes {
            if let Some(reason) = &closed {
                tasks.push((node.clone(), Err(reason.clone())));
                continue;
            }
            match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => {
                    let handle = self.spawn_node_task(node.clone(), &artifact, permit);
                    tasks.push((node.clone(), Ok(handle)));
                }
                Err(e) => {
                    error!("Node semaphore closed, aborting rest of wave {}: {}", wave.id, e);
                    let reason = e.to_string();
                    tasks.push((node.clone(), Err(reason.clone())));
                    closed = Some(reason);
                }
            }
        }

        let mut nodes = Vec::with_capacity(tasks.len());
        for (node, task) in tasks {
            let report = match task {
                Ok(handle) => match handle.await {
                    Ok(report) => report,
                    Err(e) => {
                        warn!("Node {} task panicked: {}", node.id, e);
                        aborted(node, e.to_string())
                    }
                },
                Err(reason) => aborted(node, reason),
            };
            nodes.push(report);
        }

        let report = WaveReport::completed(wave.id.clone(), nodes);
        info!("Wave {} finished: {:?}", wave.id, report.status);
        report
    }

    fn spawn_node_task(
        &self,
        node: OrchestrationNode,
        artifact: &Arc<Vec<u8>>,
        permit: OwnedSemaphorePermit,
    ) -> JoinHandle<NodeReport> {
        let executor = self.clone();
        let artifact = Arc::clone(artifact);

        tokio::spawn(async move {
            let result = executor.execute_node(&node, &artifact).await;
            drop(permit);

            match result {
                Ok(outcome) => NodeReport {
                    node_id: node.id,
                    job_name: node.job_name,
                    outcome,
                    error: None,
                },
                Err((e, outcome)) => {
                    error!("{}", e);
                    NodeReport {
                        node_id: node.id,
                        job_name: node.job_name,
                        outcome,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
    }

    /// Deploy the node's target, then run its post actions in run order
    ///
    /// On failure the monitor outcome, if one was reached, is returned along
    /// with the error.
    async fn execute_node(
        &self,
        node: &OrchestrationNode,
        artifact: &[u8],
    ) -> Result<Option<MonitorOutcome>, (ExecutorError, Option<MonitorOutcome>)> {
        debug!("Deploying stage {} for node {}", node.target.stage_id, node.id);
        self.deployer.deploy(&node.target).await.map_err(|e| {
            let error = ExecutorError::Deploy {
                node_id: node.id.clone(),
                reason: format!("{:#}", e),
            };
            (error, None)
        })?;

        let mut outcome = None;
        for action in node.scheduled_actions() {
            debug!(
                "Node {}: running {} (run order {})",
                node.id,
                action.name(),
                action.run_order()
            );

            match action {
                PostAction::PushArtifact { bucket, key, .. } => {
                    self.artifacts
                        .put_object(bucket, key, artifact.to_vec())
                        .await
                        .map_err(|source| {
                            let error = ExecutorError::Push {
                                node_id: node.id.clone(),
                                job_name: node.job_name.clone(),
                                source,
                            };
                            (error, None)
                        })?;
                }
                PostAction::InvokeMonitor { job_name, .. } => {
                    let finished = self
                        .monitor
                        .run(&MonitorInput::new(job_name.clone()))
                        .await
                        .map_err(|source| {
                            let error = ExecutorError::Monitor {
                                node_id: node.id.clone(),
                                source,
                            };
                            (error, None)
                        })?;

                    if !finished.is_success() {
                        let error = ExecutorError::JobFailed {
                            node_id: node.id.clone(),
                            job_name: finished.job_name.clone(),
                            terminal: finished.terminal.label(),
                            last_status: finished.last_status(),
                        };
                        return Err((error, Some(finished)));
                    }

                    outcome = Some(finished);
                }
            }
        }

        info!("Node {} completed", node.id);
        Ok(outcome)
    }
}

fn aborted(node: OrchestrationNode, reason: String) -> NodeReport {
    let error = ExecutorError::Aborted {
        node_id: node.id.clone(),
        reason,
    };
    NodeReport {
        node_id: node.id,
        job_name: node.job_name,
        outcome: None,
        error: Some(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorSettings;
    use async_trait::async_trait;
    use flotilla_client::memory::InMemoryArtifactStore;
    use flotilla_client::{ClientError, JobClient};
    use flotilla_core::domain::build::CodeSource;
    use flotilla_core::domain::job::{ExecutionId, JobStatus};
    use flotilla_core::domain::node::TargetRef;
    use flotilla_core::{PipelineBuilder, PipelineProps};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records deployments and fails the listed stages
    #[derive(Default)]
    struct RecordingDeployer {
        deployed: Mutex<Vec<String>>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl StageDeployer for RecordingDeployer {
        async fn deploy(&self, target: &TargetRef) -> anyhow::Result<()> {
            self.deployed.lock().unwrap().push(target.stage_id.clone());
            if self.failing.contains(&target.stage_id) {
                anyhow::bail!("stack {} rolled back", target.stage_id);
            }
            Ok(())
        }
    }

    /// Job service that records whether the job's artifact existed when the
    /// job was started, and answers every status check with a fixed status
    struct FixedJobs {
        artifacts: Arc<InMemoryArtifactStore>,
        bucket: String,
        statuses: HashMap<String, JobStatus>,
        started: Mutex<Vec<(String, bool)>>,
    }

    impl FixedJobs {
        fn new(artifacts: Arc<InMemoryArtifactStore>, statuses: &[(&str, JobStatus)]) -> Self {
            Self {
                artifacts,
                bucket: "root-assets".to_string(),
                statuses: statuses
                    .iter()
                    .map(|(name, status)| (name.to_string(), status.clone()))
                    .collect(),
                started: Mutex::new(Vec::new()),
            }
        }

        fn started(&self) -> Vec<(String, bool)> {
            self.started.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobClient for FixedJobs {
        async fn start(&self, job_name: &str) -> flotilla_client::Result<ExecutionId> {
            let key = format!("{}/source.zip", job_name);
            let pushed = self.artifacts.get_object(&self.bucket, &key).await.is_some();
            self.started
                .lock()
                .unwrap()
                .push((job_name.to_string(), pushed));
            Ok(ExecutionId::new(format!("exec-{}", job_name)))
        }

        async fn get_status(
            &self,
            _execution_id: &ExecutionId,
            job_name: &str,
        ) -> flotilla_client::Result<JobStatus> {
            self.statuses
                .get(job_name)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(job_name.to_string()))
        }
    }

    fn pipeline(waves: &[(&str, &[&str])]) -> AssembledPipeline {
        let props = PipelineProps::new("root")
            .with_asset_bucket("root-assets")
            .with_source(CodeSource::new("org/infra", "main"));
        let builder = PipelineBuilder::new(props).unwrap();
        for (wave_id, environments) in waves {
            let wave = builder.add_wave(*wave_id).unwrap();
            for env in *environments {
                wave.add_node(TargetRef::for_environment(*env), format!("{}-pipeline", env))
                    .unwrap();
            }
        }
        builder.finalize().unwrap()
    }

    fn executor(
        deployer: Arc<RecordingDeployer>,
        artifacts: Arc<InMemoryArtifactStore>,
        jobs: Arc<FixedJobs>,
        settings: ExecutorSettings,
    ) -> WaveExecutor {
        let monitor = ExecutionMonitor::new(
            jobs,
            MonitorSettings {
                poll_interval: Duration::from_secs(1),
                ..MonitorSettings::default()
            },
        );
        WaveExecutor::new(deployer, artifacts, monitor, settings)
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_waves_succeed() {
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let jobs = Arc::new(FixedJobs::new(
            artifacts.clone(),
            &[
                ("dev-pipeline", JobStatus::Succeeded),
                ("qa-pipeline", JobStatus::Succeeded),
                ("prod-pipeline", JobStatus::Succeeded),
            ],
        ));
        let deployer = Arc::new(RecordingDeployer::default());
        let executor = executor(
            deployer.clone(),
            artifacts.clone(),
            jobs.clone(),
            ExecutorSettings::default(),
        );

        let pipeline = pipeline(&[("pre-prod", &["dev", "qa"]), ("prod", &["prod"])]);
        let report = executor.execute(&pipeline, Arc::new(vec![0x50, 0x4b])).await;

        assert!(report.is_success());
        assert_eq!(report.pipeline_id, "root");
        assert_eq!(report.waves.len(), 2);
        assert_eq!(report.waves[0].nodes.len(), 2);
        assert!(report.waves[0].nodes.iter().all(|n| n.outcome.is_some()));

        assert_eq!(
            artifacts.keys("root-assets").await,
            vec![
                "dev-pipeline/source.zip",
                "prod-pipeline/source.zip",
                "qa-pipeline/source.zip"
            ]
        );
        assert_eq!(
            artifacts
                .get_object("root-assets", "prod-pipeline/source.zip")
                .await,
            Some(vec![0x50, 0x4b])
        );

        // every job started only after its artifact was pushed
        let started = jobs.started();
        assert_eq!(started.len(), 3);
        assert!(started.iter().all(|(_, pushed)| *pushed));

        // prod's wave starts after pre-prod's wave finished
        let deployed = deployer.deployed.lock().unwrap().clone();
        assert_eq!(deployed.last().map(String::as_str), Some("prod-Stage"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_skips_later_waves() {
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let jobs = Arc::new(FixedJobs::new(
            artifacts.clone(),
            &[
                ("dev-pipeline", JobStatus::Failed),
                ("qa-pipeline", JobStatus::Succeeded),
                ("prod-pipeline", JobStatus::Succeeded),
            ],
        ));
        let deployer = Arc::new(RecordingDeployer::default());
        let executor = executor(
            deployer.clone(),
            artifacts,
            jobs.clone(),
            ExecutorSettings::default(),
        );

        let pipeline = pipeline(&[("pre-prod", &["dev", "qa"]), ("prod", &["prod"])]);
        let report = executor.execute(&pipeline, Arc::new(vec![1])).await;

        assert!(!report.is_success());
        assert_eq!(report.waves[0].status, WaveStatus::Failed);
        assert_eq!(report.waves[1].status, WaveStatus::Skipped);

        let failed: Vec<&NodeReport> = report.failed_nodes().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].node_id, "dev-Stage");
        assert_eq!(
            failed[0].outcome.as_ref().map(|o| o.terminal.label()),
            Some("Failed")
        );
        assert!(failed[0].error.as_deref().unwrap().contains("dev-pipeline"));

        // the sibling node still ran to completion
        assert!(report.waves[0].nodes[1].succeeded());
        assert!(!jobs.started().iter().any(|(name, _)| name == "prod-pipeline"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_failure_halts_node_actions() {
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let jobs = Arc::new(FixedJobs::new(
            artifacts.clone(),
            &[("dev-pipeline", JobStatus::Succeeded)],
        ));
        let deployer = Arc::new(RecordingDeployer {
            failing: vec!["dev-Stage".to_string()],
            ..RecordingDeployer::default()
        });
        let executor = executor(
            deployer,
            artifacts.clone(),
            jobs.clone(),
            ExecutorSettings::default(),
        );

        let report = executor
            .execute(&pipeline(&[("pre-prod", &["dev"])]), Arc::new(vec![1]))
            .await;

        let node = &report.waves[0].nodes[0];
        assert!(node.outcome.is_none());
        assert!(node.error.as_deref().unwrap().contains("rolled back"));
        assert!(artifacts.keys("root-assets").await.is_empty());
        assert!(jobs.started().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_waves_run_despite_failure() {
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let jobs = Arc::new(FixedJobs::new(
            artifacts.clone(),
            &[
                ("dev-pipeline", JobStatus::Failed),
                ("prod-pipeline", JobStatus::Succeeded),
            ],
        ));
        let executor = executor(
            Arc::new(RecordingDeployer::default()),
            artifacts,
            jobs,
            ExecutorSettings {
                max_parallel_nodes: 2,
                parallel_waves: true,
            },
        );

        let report = executor
            .execute(
                &pipeline(&[("pre-prod", &["dev"]), ("prod", &["prod"])]),
                Arc::new(vec![1]),
            )
            .await;

        assert_eq!(report.waves[0].status, WaveStatus::Failed);
        assert_eq!(report.waves[1].status, WaveStatus::Succeeded);
        assert_eq!(report.waves[1].id, "prod");
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_semaphore_reports_every_node_aborted() {
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let jobs = Arc::new(FixedJobs::new(
            artifacts.clone(),
            &[
                ("dev-pipeline", JobStatus::Succeeded),
                ("qa-pipeline", JobStatus::Succeeded),
            ],
        ));
        let deployer = Arc::new(RecordingDeployer::default());
        let executor = executor(
            deployer.clone(),
            artifacts,
            jobs.clone(),
            ExecutorSettings::default(),
        );
        executor.semaphore.close();

        let pipeline = pipeline(&[("pre-prod", &["dev", "qa"]), ("prod", &["prod"])]);
        let report = executor.execute(&pipeline, Arc::new(vec![1])).await;

        assert!(!report.is_success());
        assert_eq!(report.waves[0].status, WaveStatus::Failed);
        assert_eq!(report.waves[1].status, WaveStatus::Skipped);

        let ids: Vec<&str> = report.waves[0]
            .nodes
            .iter()
            .map(|n| n.node_id.as_str())
            .collect();
        assert_eq!(ids, vec!["dev-Stage", "qa-Stage"]);
        assert!(report.waves[0].nodes.iter().all(|n| {
            n.outcome.is_none() && n.error.as_deref().unwrap().contains("task aborted")
        }));

        assert!(deployer.deployed.lock().unwrap().is_empty());
        assert!(jobs.started().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_pipeline_succeeds() {
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let jobs = Arc::new(FixedJobs::new(artifacts.clone(), &[]));
        let executor = executor(
            Arc::new(RecordingDeployer::default()),
            artifacts,
            jobs,
            ExecutorSettings::default(),
        );

        let report = executor.execute(&pipeline(&[]), Arc::new(Vec::new())).await;

        assert!(report.is_success());
        assert!(report.waves.is_empty());
    }
}
