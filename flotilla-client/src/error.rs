//! Failures reported by the job, artifact and parameter services

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, reset)
    #[error("request to remote service failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("remote service rejected the call (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// A success response whose body is not the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Unknown job, execution, object or parameter
    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected locally before any call was made
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Remote { status: 404, .. })
    }

    /// 4xx: the caller's fault, repeating the call cannot help
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Remote { status, .. } if (400..500).contains(status))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Remote { status, .. } if *status >= 500)
    }

    /// Whether a status poll that failed this way may be retried
    ///
    /// Transport failures, throttling (429) and 5xx answers can clear up on
    /// their own. Everything else, including an unknown job or a body that
    /// does not parse, is reported as is.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Remote { status: 429, .. } => true,
            _ => self.is_server_error(),
        }
    }
}
