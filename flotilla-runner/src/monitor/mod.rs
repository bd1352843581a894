//! Execution monitor
//!
//! Starts a named job and polls its status until it reaches a terminal
//! state. Waiting is a `tokio::time::sleep`, so a monitor run holds no
//! thread while suspended and many runs can share one runtime.

pub mod state;

pub use state::MonitorState;

use chrono::Utc;
use flotilla_client::JobClient;
use flotilla_core::domain::job::{ExecutionId, Job, JobStatus};
use flotilla_core::dto::monitor::{MonitorInput, MonitorOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::MonitorError;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Polling cadence and bounds of a monitor run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Wait before every status check, including the first
    pub poll_interval: Duration,

    /// Status checks allowed before the run times out (`None` = unbounded)
    pub max_polls: Option<u32>,

    /// Retries of a transiently failing status call
    pub status_retries: u32,

    /// First retry delay, doubled on each further attempt
    pub retry_base_delay: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_polls: Some(120),
            status_retries: 0,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Drives one job from start to a terminal state
///
/// Holds no per-job state, so one monitor can serve any number of runs,
/// sequentially or concurrently.
#[derive(Clone)]
pub struct ExecutionMonitor {
    client: Arc<dyn JobClient>,
    settings: MonitorSettings,
}

impl ExecutionMonitor {
    pub fn new(client: Arc<dyn JobClient>, settings: MonitorSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Run the state machine for `input.job_name`
    ///
    /// A job ending `Failed` or running out of polls is a successful run with
    /// a non-`Done` terminal. Errors are reserved for the job service itself
    /// failing.
    pub async fn run(&self, input: &MonitorInput) -> Result<MonitorOutcome, MonitorError> {
        let mut job = Job::new(input.job_name.clone());
        let started_at = Utc::now();
        let mut polls: u32 = 0;
        let mut state = MonitorState::Start;

        loop {
            if let Some((execution_id, terminal)) = state.terminal() {
                info!(
                    "Job {} execution {} finished as {} after {} poll(s)",
                    job.name,
                    execution_id,
                    terminal.label(),
                    polls
                );

                return Ok(MonitorOutcome {
                    job_name: job.name,
                    execution_id: execution_id.clone(),
                    terminal,
                    polls,
                    started_at,
                    finished_at: Utc::now(),
                });
            }

            state = match state {
                MonitorState::Start => {
                    let execution_id = self.start_job(&job.name).await?;
                    job.record_start(execution_id.clone());
                    MonitorState::Wait(execution_id)
                }
                MonitorState::Wait(execution_id) => {
                    tokio::time::sleep(self.settings.poll_interval).await;
                    MonitorState::Check(execution_id)
                }
                MonitorState::Check(execution_id) => {
                    let status = self.check_status(&job.name, &execution_id).await?;
                    polls += 1;
                    debug!(
                        "Job {} execution {} poll {}: {}",
                        job.name, execution_id, polls, status
                    );
                    job.observe(status.clone());
                    MonitorState::after_check(execution_id, status, polls, self.settings.max_polls)
                }
                terminal => terminal,
            };
        }
    }

    async fn start_job(&self, job_name: &str) -> Result<ExecutionId, MonitorError> {
        let execution_id =
            self.client
                .start(job_name)
                .await
                .map_err(|source| MonitorError::Start {
                    job_name: job_name.to_string(),
                    source,
                })?;

        info!("Started job {} as execution {}", job_name, execution_id);
        Ok(execution_id)
    }

    /// Read the status, retrying transient failures with exponential backoff
    async fn check_status(
        &self,
        job_name: &str,
        execution_id: &ExecutionId,
    ) -> Result<JobStatus, MonitorError> {
        let mut attempt = 0;
        let mut delay = self.settings.retry_base_delay;

        loop {
            match self.client.get_status(execution_id, job_name).await {
                Ok(status) => return Ok(status),
                Err(e) if attempt < self.settings.status_retries && e.is_transient() => {
                    attempt += 1;
                    warn!(
                        "Status check of job {} failed (attempt {}/{}): {}",
                        job_name, attempt, self.settings.status_retries, e
                    );
                    warn!("Retrying in {:?}...", delay);

                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
                Err(source) => {
                    return Err(MonitorError::Status {
                        job_name: job_name.to_string(),
                        execution_id: execution_id.clone(),
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_client::ClientError;
    use async_trait::async_trait;
    use flotilla_core::dto::monitor::MonitorTerminal;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::time::Instant;

    type StatusScript = VecDeque<flotilla_client::Result<JobStatus>>;

    /// Job service answering from per-job status scripts
    #[derive(Default)]
    struct ScriptedJobs {
        scripts: Mutex<HashMap<String, StatusScript>>,
        refuse_start: Mutex<Option<u16>>,
        started: Mutex<Vec<String>>,
        checks: Mutex<Vec<(ExecutionId, String)>>,
    }

    impl ScriptedJobs {
        fn with_script(
            self,
            job_name: &str,
            script: impl IntoIterator<Item = flotilla_client::Result<JobStatus>>,
        ) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .insert(job_name.to_string(), script.into_iter().collect());
            self
        }

        fn checks(&self) -> Vec<(ExecutionId, String)> {
            self.checks.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobClient for ScriptedJobs {
        async fn start(&self, job_name: &str) -> flotilla_client::Result<ExecutionId> {
            if let Some(status) = *self.refuse_start.lock().unwrap() {
                return Err(ClientError::remote(status, "no such job"));
            }
            let mut started = self.started.lock().unwrap();
            started.push(job_name.to_string());
            Ok(ExecutionId::new(format!("exec-{}", started.len())))
        }

        async fn get_status(
            &self,
            execution_id: &ExecutionId,
            job_name: &str,
        ) -> flotilla_client::Result<JobStatus> {
            self.checks
                .lock()
                .unwrap()
                .push((execution_id.clone(), job_name.to_string()));
            self.scripts
                .lock()
                .unwrap()
                .get_mut(job_name)
                .and_then(|script| script.pop_front())
                .unwrap_or(Ok(JobStatus::InProgress))
        }
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_secs(30),
            max_polls: Some(10),
            status_retries: 0,
            retry_base_delay: Duration::from_millis(500),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_progress_then_succeeded_is_done() {
        let jobs = Arc::new(
            ScriptedJobs::default()
                .with_script("qa-pipeline", [Ok(JobStatus::InProgress), Ok(JobStatus::Succeeded)]),
        );
        let monitor = ExecutionMonitor::new(jobs.clone(), settings());

        let begin = Instant::now();
        let outcome = monitor.run(&MonitorInput::new("qa-pipeline")).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.polls, 2);
        assert_eq!(outcome.job_name, "qa-pipeline");
        assert!(begin.elapsed() >= Duration::from_secs(30));
        assert_eq!(
            jobs.checks(),
            vec![
                (ExecutionId::new("exec-1"), "qa-pipeline".to_string()),
                (ExecutionId::new("exec-1"), "qa-pipeline".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_waits_one_interval() {
        let jobs = Arc::new(
            ScriptedJobs::default().with_script("qa-pipeline", [Ok(JobStatus::Succeeded)]),
        );
        let monitor = ExecutionMonitor::new(jobs, settings());

        let begin = Instant::now();
        let outcome = monitor.run(&MonitorInput::new("qa-pipeline")).await.unwrap();

        assert_eq!(outcome.polls, 1);
        assert!(begin.elapsed() >= Duration::from_secs(30));
        assert!(begin.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_is_failed_terminal() {
        let jobs = Arc::new(
            ScriptedJobs::default().with_script("dev-pipeline", [Ok(JobStatus::Failed)]),
        );
        let monitor = ExecutionMonitor::new(jobs, settings());

        let outcome = monitor
            .run(&MonitorInput::new("dev-pipeline"))
            .await
            .unwrap();

        assert_eq!(outcome.polls, 1);
        assert_eq!(
            outcome.terminal,
            MonitorTerminal::Failed {
                last_status: JobStatus::Failed
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_fails_closed() {
        let jobs = Arc::new(ScriptedJobs::default().with_script(
            "prod-pipeline",
            [
                Ok(JobStatus::InProgress),
                Ok(JobStatus::Other("Stopped".to_string())),
            ],
        ));
        let monitor = ExecutionMonitor::new(jobs, settings());

        let outcome = monitor
            .run(&MonitorInput::new("prod-pipeline"))
            .await
            .unwrap();

        assert_eq!(outcome.terminal.label(), "Failed");
        assert_eq!(outcome.last_status().as_str(), "Stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_budget_times_out() {
        let jobs = Arc::new(ScriptedJobs::default());
        let monitor = ExecutionMonitor::new(
            jobs.clone(),
            MonitorSettings {
                max_polls: Some(3),
                ..settings()
            },
        );

        let begin = Instant::now();
        let outcome = monitor.run(&MonitorInput::new("slow-job")).await.unwrap();

        assert_eq!(
            outcome.terminal,
            MonitorTerminal::TimedOut {
                last_status: JobStatus::InProgress
            }
        );
        assert_eq!(outcome.polls, 3);
        assert_eq!(jobs.checks().len(), 3);
        assert!(begin.elapsed() >= Duration::from_secs(90));
        assert!(begin.elapsed() < Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_error_propagates() {
        let jobs = ScriptedJobs::default();
        *jobs.refuse_start.lock().unwrap() = Some(404);
        let jobs = Arc::new(jobs);
        let monitor = ExecutionMonitor::new(jobs.clone(), settings());

        let err = monitor
            .run(&MonitorInput::new("missing-job"))
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::Start { ref source, .. } if source.is_not_found()));
        assert_eq!(err.job_name(), "missing-job");
        assert!(jobs.checks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_error_propagates_without_retries() {
        let jobs = Arc::new(ScriptedJobs::default().with_script(
            "qa-pipeline",
            [
                Err(ClientError::remote(503, "unavailable")),
                Ok(JobStatus::Succeeded),
            ],
        ));
        let monitor = ExecutionMonitor::new(jobs.clone(), settings());

        let err = monitor
            .run(&MonitorInput::new("qa-pipeline"))
            .await
            .unwrap_err();

        match err {
            MonitorError::Status {
                execution_id,
                source,
                ..
            } => {
                assert_eq!(execution_id, ExecutionId::new("exec-1"));
                assert!(source.is_server_error());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(jobs.checks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_status_error_is_retried() {
        let jobs = Arc::new(ScriptedJobs::default().with_script(
            "qa-pipeline",
            [
                Err(ClientError::remote(503, "unavailable")),
                Err(ClientError::remote(502, "bad gateway")),
                Ok(JobStatus::Succeeded),
            ],
        ));
        let monitor = ExecutionMonitor::new(
            jobs.clone(),
            MonitorSettings {
                status_retries: 2,
                ..settings()
            },
        );

        let begin = Instant::now();
        let outcome = monitor.run(&MonitorInput::new("qa-pipeline")).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.polls, 1);
        assert_eq!(jobs.checks().len(), 3);
        // one interval plus 500ms and 1s of backoff
        assert!(begin.elapsed() >= Duration::from_millis(31_500));
        assert!(begin.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_status_check_is_retried() {
        let jobs = Arc::new(ScriptedJobs::default().with_script(
            "qa-pipeline",
            [
                Err(ClientError::remote(429, "rate exceeded")),
                Ok(JobStatus::Failed),
            ],
        ));
        let monitor = ExecutionMonitor::new(
            jobs.clone(),
            MonitorSettings {
                status_retries: 1,
                ..settings()
            },
        );

        let outcome = monitor.run(&MonitorInput::new("qa-pipeline")).await.unwrap();

        assert!(!outcome.is_success());
        assert_eq!(jobs.checks().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_not_retried() {
        let jobs = Arc::new(ScriptedJobs::default().with_script(
            "qa-pipeline",
            [Err(ClientError::remote(403, "denied"))],
        ));
        let monitor = ExecutionMonitor::new(
            jobs.clone(),
            MonitorSettings {
                status_retries: 5,
                ..settings()
            },
        );

        let err = monitor
            .run(&MonitorInput::new("qa-pipeline"))
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::Status { .. }));
        assert_eq!(jobs.checks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_is_reusable_across_jobs() {
        let jobs = Arc::new(
            ScriptedJobs::default()
                .with_script("qa-pipeline", [Ok(JobStatus::Succeeded)])
                .with_script("dev-pipeline", [Ok(JobStatus::Failed)]),
        );
        let monitor = ExecutionMonitor::new(jobs.clone(), settings());

        let qa_input = MonitorInput::new("qa-pipeline");
        let dev_input = MonitorInput::new("dev-pipeline");
        let (qa, dev) = tokio::join!(monitor.run(&qa_input), monitor.run(&dev_input));
        let qa = qa.unwrap();
        let dev = dev.unwrap();

        assert!(qa.is_success());
        assert!(!dev.is_success());
        assert_ne!(qa.execution_id, dev.execution_id);

        // each status check pairs the job name with its own execution id
        for (execution_id, job_name) in jobs.checks() {
            let expected = if job_name == "qa-pipeline" {
                &qa.execution_id
            } else {
                &dev.execution_id
            };
            assert_eq!(&execution_id, expected);
        }
    }
}
