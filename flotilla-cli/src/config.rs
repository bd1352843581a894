//! Configuration module
//!
//! Handles CLI configuration shared by every command.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the job, artifact and parameter services
    pub job_service_url: String,
}
