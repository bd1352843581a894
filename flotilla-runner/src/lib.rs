//! Flotilla Runner
//!
//! Runtime side of the orchestrator:
//! - Monitor: the polling state machine that starts a job and waits for it
//!   to reach a terminal state
//! - Scheduler: executes an assembled graph wave by wave
//! - Configuration: runner settings loaded from the environment

pub mod config;
pub mod error;
pub mod monitor;
pub mod scheduler;

pub use config::Config;
pub use error::{ExecutorError, MonitorError};
pub use monitor::{ExecutionMonitor, MonitorSettings, MonitorState};
pub use scheduler::{
    DeploymentReport, ExecutorSettings, PreDeployedStages, StageDeployer, WaveExecutor,
};
