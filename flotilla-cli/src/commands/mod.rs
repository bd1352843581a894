//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod monitor;
mod plan;
mod run;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Assemble a deployment plan and print the orchestration graph
    Plan {
        /// Path to the plan file (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Print the assembled graph as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start a job and wait until it reaches a terminal state
    Monitor {
        /// Name of the remote job
        job_name: String,

        /// Seconds between two status checks
        #[arg(short, long, default_value = "30")]
        interval: u64,

        /// Status checks before giving up (0 = unbounded)
        #[arg(long, default_value = "120")]
        max_polls: u32,

        /// Retries of a failing status check
        #[arg(long, default_value = "0")]
        retries: u32,
    },
    /// Execute a deployment plan wave by wave
    Run {
        /// Path to the plan file (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Packaged build output pushed to every node
        #[arg(short, long)]
        artifact: PathBuf,

        /// Seconds between two status checks [env: FLOTILLA_POLL_INTERVAL, default: 30]
        #[arg(short, long)]
        interval: Option<u64>,

        /// Status checks per job before giving up, 0 = unbounded
        /// [env: FLOTILLA_MAX_POLLS, default: 120]
        #[arg(long)]
        max_polls: Option<u32>,

        /// Retries of a failing status check [env: FLOTILLA_STATUS_RETRIES, default: 0]
        #[arg(long)]
        retries: Option<u32>,

        /// Maximum nodes executing at once [env: FLOTILLA_MAX_PARALLEL_NODES, default: 4]
        #[arg(long)]
        max_parallel: Option<usize>,

        /// Start all waves at once instead of in order [env: FLOTILLA_PARALLEL_WAVES]
        #[arg(long)]
        parallel_waves: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Plan { file, json } => plan::handle_plan_command(&file, json),
        Commands::Monitor {
            job_name,
            interval,
            max_polls,
            retries,
        } => {
            monitor::handle_monitor_command(config, &job_name, interval, max_polls, retries).await
        }
        Commands::Run {
            file,
            artifact,
            interval,
            max_polls,
            retries,
            max_parallel,
            parallel_waves,
        } => {
            let settings = run::RunSettings {
                interval,
                max_polls,
                retries,
                max_parallel,
                parallel_waves,
            };
            run::handle_run_command(config, &file, &artifact, settings).await
        }
    }
}
