//! Runner configuration
//!
//! Defines all configurable parameters for the runner including the job
//! service connection, polling cadence and bound, and wave parallelism.

use std::time::Duration;

use crate::monitor::MonitorSettings;
use crate::scheduler::ExecutorSettings;

/// Default wait between two status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default polling budget (one hour at the default interval)
pub const DEFAULT_MAX_POLLS: u32 = 120;

/// Runner configuration
///
/// All intervals and bounds are configurable to allow tuning for different
/// deployment scenarios (short test jobs vs. long infrastructure rollouts).
#[derive(Debug, Clone)]
pub struct Config {
    /// Job service base URL (e.g., "http://localhost:8080")
    pub job_service_url: String,

    /// Wait between two status checks
    pub poll_interval: Duration,

    /// Maximum number of status checks before a run times out (`None` = unbounded)
    pub max_polls: Option<u32>,

    /// Retries of a failed status call before the run fails
    pub status_retries: u32,

    /// Maximum nodes of a wave executing at once
    pub max_parallel_nodes: usize,

    /// Run all waves concurrently instead of in registration order
    pub parallel_waves: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(job_service_url: String) -> Self {
        Self {
            job_service_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: Some(DEFAULT_MAX_POLLS),
            status_retries: 0,
            max_parallel_nodes: 4,
            parallel_waves: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - FLOTILLA_JOB_SERVICE_URL (default: http://localhost:8080)
    /// - FLOTILLA_POLL_INTERVAL (seconds, default: 30)
    /// - FLOTILLA_MAX_POLLS (default: 120, 0 disables the bound)
    /// - FLOTILLA_STATUS_RETRIES (default: 0)
    /// - FLOTILLA_MAX_PARALLEL_NODES (default: 4)
    /// - FLOTILLA_PARALLEL_WAVES (true/false, default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let job_service_url =
            lookup("FLOTILLA_JOB_SERVICE_URL").unwrap_or(defaults.job_service_url);

        let poll_interval = lookup("FLOTILLA_POLL_INTERVAL")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        let max_polls = match lookup("FLOTILLA_MAX_POLLS").and_then(|s| s.parse::<u32>().ok()) {
            Some(0) => None,
            Some(max) => Some(max),
            None => defaults.max_polls,
        };

        let status_retries = lookup("FLOTILLA_STATUS_RETRIES")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.status_retries);

        let max_parallel_nodes = lookup("FLOTILLA_MAX_PARALLEL_NODES")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_parallel_nodes);

        let parallel_waves = lookup("FLOTILLA_PARALLEL_WAVES")
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(defaults.parallel_waves);

        Self {
            job_service_url,
            poll_interval,
            max_polls,
            status_retries,
            max_parallel_nodes,
            parallel_waves,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.job_service_url.is_empty() {
            anyhow::bail!("job_service_url cannot be empty");
        }

        if !self.job_service_url.starts_with("http://")
            && !self.job_service_url.starts_with("https://")
        {
            anyhow::bail!("job_service_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_parallel_nodes == 0 {
            anyhow::bail!("max_parallel_nodes must be greater than 0");
        }

        Ok(())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: self.poll_interval,
            max_polls: self.max_polls,
            status_retries: self.status_retries,
            ..MonitorSettings::default()
        }
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            max_parallel_nodes: self.max_parallel_nodes,
            parallel_waves: self.parallel_waves,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.max_polls, Some(120));
        assert_eq!(config.status_retries, 0);
        assert!(!config.parallel_waves);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("FLOTILLA_JOB_SERVICE_URL", "https://jobs.internal"),
            ("FLOTILLA_POLL_INTERVAL", "5"),
            ("FLOTILLA_MAX_POLLS", "10"),
            ("FLOTILLA_STATUS_RETRIES", "2"),
            ("FLOTILLA_PARALLEL_WAVES", "true"),
        ]));

        assert_eq!(config.job_service_url, "https://jobs.internal");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_polls, Some(10));
        assert_eq!(config.status_retries, 2);
        assert_eq!(config.max_parallel_nodes, 4);
        assert!(config.parallel_waves);
    }

    #[test]
    fn test_zero_max_polls_disables_bound() {
        let config = Config::from_lookup(lookup_from(&[("FLOTILLA_MAX_POLLS", "0")]));
        assert_eq!(config.max_polls, None);
    }

    #[test]
    fn test_unparsable_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("FLOTILLA_POLL_INTERVAL", "soon"),
            ("FLOTILLA_PARALLEL_WAVES", "yes"),
        ]));
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(!config.parallel_waves);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.job_service_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.job_service_url = "http://localhost:8080".to_string();
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        config.poll_interval = Duration::from_secs(1);
        config.max_parallel_nodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_projection() {
        let config = Config {
            status_retries: 3,
            max_parallel_nodes: 2,
            ..Config::default()
        };
        assert_eq!(config.monitor_settings().status_retries, 3);
        assert_eq!(config.monitor_settings().poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.executor_settings().max_parallel_nodes, 2);
    }
}
