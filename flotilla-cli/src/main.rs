//! Flotilla CLI
//!
//! Command-line interface for assembling deployment plans and driving their
//! execution against the remote job service.

mod commands;
mod config;
mod plan;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "flotilla")]
#[command(about = "Flotilla multi-stage deployment CLI", long_about = None)]
struct Cli {
    /// Job service URL
    #[arg(
        long,
        env = "FLOTILLA_JOB_SERVICE_URL",
        default_value = "http://localhost:8080"
    )]
    job_service_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flotilla_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        job_service_url: cli.job_service_url,
    };

    handle_command(cli.command, &config).await
}
