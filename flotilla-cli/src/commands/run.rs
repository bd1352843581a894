//! Run command handler
//!
//! Publishes the shared asset location, then executes every wave of the plan.
//! Stages are expected to be provisioned already; the command drives the
//! artifact pushes and job monitors.

use anyhow::{Context, Result};
use colored::*;
use flotilla_client::{ServiceClient, publish_location};
use flotilla_runner::scheduler::{DeploymentReport, WaveStatus};
use flotilla_runner::{ExecutionMonitor, PreDeployedStages, WaveExecutor};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::plan::DeploymentPlan;

/// Command-line overrides of the runner configuration
///
/// Unset flags keep the value loaded from the `FLOTILLA_*` environment.
#[derive(Debug, Default)]
pub struct RunSettings {
    pub interval: Option<u64>,
    /// 0 disables the bound
    pub max_polls: Option<u32>,
    pub retries: Option<u32>,
    pub max_parallel: Option<usize>,
    pub parallel_waves: bool,
}

impl RunSettings {
    pub fn apply(&self, mut runner: flotilla_runner::Config) -> flotilla_runner::Config {
        if let Some(interval) = self.interval {
            runner.poll_interval = Duration::from_secs(interval);
        }
        if let Some(max_polls) = self.max_polls {
            runner.max_polls = (max_polls > 0).then_some(max_polls);
        }
        if let Some(retries) = self.retries {
            runner.status_retries = retries;
        }
        if let Some(max_parallel) = self.max_parallel {
            runner.max_parallel_nodes = max_parallel;
        }
        runner.parallel_waves |= self.parallel_waves;
        runner
    }
}

pub async fn handle_run_command(
    config: &Config,
    file: &Path,
    artifact: &Path,
    settings: RunSettings,
) -> Result<()> {
    let runner = settings.apply(flotilla_runner::Config {
        job_service_url: config.job_service_url.clone(),
        ..flotilla_runner::Config::from_env()
    });
    runner.validate().context("Invalid run settings")?;
    info!(
        "Running with poll_interval={:?}, max_polls={:?}, status_retries={}, max_parallel_nodes={}, parallel_waves={}",
        runner.poll_interval,
        runner.max_polls,
        runner.status_retries,
        runner.max_parallel_nodes,
        runner.parallel_waves
    );

    let pipeline = DeploymentPlan::from_file(file)?
        .assemble()
        .context("Failed to assemble deployment plan")?;

    let body = std::fs::read(artifact)
        .with_context(|| format!("Failed to read artifact: {}", artifact.display()))?;
    info!("Loaded artifact {} ({} bytes)", artifact.display(), body.len());

    let client = Arc::new(ServiceClient::new(runner.job_service_url.clone()));

    publish_location(client.as_ref(), &pipeline.asset_location)
        .await
        .context("Failed to publish the asset bucket location")?;

    let monitor = ExecutionMonitor::new(client.clone(), runner.monitor_settings());
    let executor = WaveExecutor::new(
        Arc::new(PreDeployedStages),
        client,
        monitor,
        runner.executor_settings(),
    );

    let report = executor.execute(&pipeline, Arc::new(body)).await;
    print_report(&report);

    if !report.is_success() {
        anyhow::bail!("deployment {} failed", report.run_id);
    }

    Ok(())
}

fn print_report(report: &DeploymentReport) {
    println!("{}", "Deployment Report:".bold());
    println!("  Run:      {}", report.run_id.to_string().cyan());
    println!("  Pipeline: {}", report.pipeline_id.bold());
    println!(
        "  Duration: {}s",
        (report.finished_at - report.started_at).num_seconds()
    );

    for wave in &report.waves {
        let status = match wave.status {
            WaveStatus::Succeeded => "succeeded".green(),
            WaveStatus::Failed => "failed".red(),
            WaveStatus::Skipped => "skipped".yellow(),
        };
        println!();
        println!("  {} {} {}", "▸".cyan(), wave.id.bold(), status);

        for node in &wave.nodes {
            let mark = if node.succeeded() {
                "✓".green()
            } else {
                "✗".red()
            };
            println!("    {} {} ({})", mark, node.node_id, node.job_name.dimmed());
            if let Some(outcome) = &node.outcome {
                println!(
                    "      execution {} after {} poll(s)",
                    outcome.execution_id.to_string().dimmed(),
                    outcome.polls
                );
            }
            if let Some(error) = &node.error {
                println!("      {}", error.red());
            }
        }
    }
}
