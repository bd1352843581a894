//! Monitor command handler

use anyhow::{Context, Result};
use colored::*;
use flotilla_client::ServiceClient;
use flotilla_core::dto::monitor::{MonitorInput, MonitorTerminal};
use flotilla_runner::{ExecutionMonitor, MonitorSettings};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

pub async fn handle_monitor_command(
    config: &Config,
    job_name: &str,
    interval: u64,
    max_polls: u32,
    retries: u32,
) -> Result<()> {
    if interval == 0 {
        anyhow::bail!("--interval must be greater than 0");
    }

    let client = Arc::new(ServiceClient::new(config.job_service_url.clone()));
    let monitor = ExecutionMonitor::new(
        client,
        MonitorSettings {
            poll_interval: Duration::from_secs(interval),
            max_polls: (max_polls > 0).then_some(max_polls),
            status_retries: retries,
            ..MonitorSettings::default()
        },
    );

    println!(
        "{}",
        format!("Monitoring job {} (every {}s)...", job_name, interval).dimmed()
    );

    let outcome = monitor
        .run(&MonitorInput::new(job_name))
        .await
        .with_context(|| format!("Failed to monitor job {}", job_name))?;

    let elapsed = outcome.finished_at - outcome.started_at;
    match &outcome.terminal {
        MonitorTerminal::Done => {
            println!("{}", format!("✓ Job {} succeeded", job_name).green().bold());
        }
        MonitorTerminal::Failed { last_status } => {
            println!(
                "{}",
                format!("✗ Job {} failed with status {}", job_name, last_status)
                    .red()
                    .bold()
            );
        }
        MonitorTerminal::TimedOut { last_status } => {
            println!(
                "{}",
                format!(
                    "✗ Job {} still {} after {} poll(s)",
                    job_name, last_status, outcome.polls
                )
                .yellow()
                .bold()
            );
        }
    }
    println!("  Execution: {}", outcome.execution_id.to_string().cyan());
    println!("  Polls:     {}", outcome.polls);
    println!("  Elapsed:   {}s", elapsed.num_seconds());

    if !outcome.is_success() {
        anyhow::bail!(
            "job {} ended {} (last status: {})",
            job_name,
            outcome.terminal.label(),
            outcome.last_status()
        );
    }

    Ok(())
}
