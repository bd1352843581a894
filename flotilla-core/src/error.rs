//! Construction-time error types

use thiserror::Error;

/// Result type alias for builder operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors raised while registering or finalizing the orchestration graph
///
/// All of these are programming or configuration errors: they are surfaced
/// immediately and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Invalid construction-time arguments
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Mutation or a second finalize attempted on a finalized builder
    #[error("{operation}: the pipeline has already been finalized")]
    AlreadyFinalized {
        /// The operation that was refused
        operation: &'static str,
    },

    /// A wave or node id was registered twice in the same scope
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId {
        /// "wave", "node" or "job"
        kind: &'static str,
        /// The offending id
        id: String,
    },
}

impl BuildError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an already-finalized error for `operation`
    pub fn already_finalized(operation: &'static str) -> Self {
        Self::AlreadyFinalized { operation }
    }

    /// Check if this error was caused by touching a finalized builder
    pub fn is_already_finalized(&self) -> bool {
        matches!(self, Self::AlreadyFinalized { .. })
    }

    /// Check if this error is a configuration problem
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::DuplicateId { .. })
    }
}
