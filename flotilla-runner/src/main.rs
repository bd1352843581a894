//! Flotilla Runner
//!
//! Runs one execution monitor invocation. The payload (`{"jobName": "..."}`)
//! is read from the first argument, or from stdin when no argument is given.
//! The outcome is printed as JSON; the process exits non-zero unless the job
//! succeeded.

use anyhow::{Context, Result};
use flotilla_client::ServiceClient;
use flotilla_core::dto::monitor::MonitorInput;
use flotilla_runner::{Config, ExecutionMonitor};
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout carries only the outcome
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flotilla_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    config.validate().context("Invalid runner configuration")?;
    info!(
        "Loaded configuration: job_service_url={}, poll_interval={:?}, max_polls={:?}",
        config.job_service_url, config.poll_interval, config.max_polls
    );

    let input = read_input()?;

    let client = Arc::new(ServiceClient::new(config.job_service_url.clone()));
    let monitor = ExecutionMonitor::new(client, config.monitor_settings());

    let outcome = match monitor.run(&input).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Monitor run failed: {}", e);
            return Err(e.into());
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
    );

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            "Job {} ended {} with status {}",
            outcome.job_name,
            outcome.terminal.label(),
            outcome.last_status()
        );
        Ok(ExitCode::FAILURE)
    }
}

fn read_input() -> Result<MonitorInput> {
    let raw = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read payload from stdin")?;
            buffer
        }
    };

    let input: MonitorInput =
        serde_json::from_str(raw.trim()).context("Payload must be {\"jobName\": \"...\"}")?;

    if input.job_name.trim().is_empty() {
        anyhow::bail!("jobName must not be empty");
    }

    Ok(input)
}
