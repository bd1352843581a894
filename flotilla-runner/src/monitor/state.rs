//! Monitor state machine
//!
//! ```text
//! Start -> Wait -> Check -+-> Wait          (InProgress, budget left)
//!                         +-> Done          (Succeeded)
//!                         +-> TimedOut      (InProgress, budget spent)
//!                         +-> Failed        (anything else)
//! ```

use flotilla_core::domain::job::{ExecutionId, JobStatus};
use flotilla_core::dto::monitor::MonitorTerminal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorState {
    /// Job not started yet
    Start,
    /// Suspended for one poll interval
    Wait(ExecutionId),
    /// Reading the execution status
    Check(ExecutionId),
    Done(ExecutionId),
    Failed(ExecutionId, JobStatus),
    TimedOut(ExecutionId, JobStatus),
}

impl MonitorState {
    /// Transition out of `Check` once `status` has been observed
    ///
    /// `polls` counts checks including this one. Statuses other than
    /// `InProgress` and `Succeeded` fail closed.
    pub fn after_check(
        execution_id: ExecutionId,
        status: JobStatus,
        polls: u32,
        max_polls: Option<u32>,
    ) -> Self {
        match status {
            JobStatus::InProgress if max_polls.is_some_and(|max| polls >= max) => {
                MonitorState::TimedOut(execution_id, status)
            }
            JobStatus::InProgress => MonitorState::Wait(execution_id),
            JobStatus::Succeeded => MonitorState::Done(execution_id),
            other => MonitorState::Failed(execution_id, other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MonitorState::Start => "Start",
            MonitorState::Wait(_) => "Wait",
            MonitorState::Check(_) => "Check",
            MonitorState::Done(_) => "Done",
            MonitorState::Failed(..) => "Failed",
            MonitorState::TimedOut(..) => "TimedOut",
        }
    }

    /// Execution id and terminal result, if this state is terminal
    pub fn terminal(&self) -> Option<(&ExecutionId, MonitorTerminal)> {
        match self {
            MonitorState::Done(id) => Some((id, MonitorTerminal::Done)),
            MonitorState::Failed(id, status) => Some((
                id,
                MonitorTerminal::Failed {
                    last_status: status.clone(),
                },
            )),
            MonitorState::TimedOut(id, status) => Some((
                id,
                MonitorTerminal::TimedOut {
                    last_status: status.clone(),
                },
            )),
            MonitorState::Start | MonitorState::Wait(_) | MonitorState::Check(_) => None,
        }
    }
}
