use common::store::StoreError;
use thiserror::Error;

/// Failures talking to the remote execution backend.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("Failed to submit to execution backend: {message}")]
    Dispatch { message: String, transient: bool },

    #[error("Failed to get result from execution backend: {message}")]
    StatusFetch { message: String, transient: bool },

    #[error("Polling timeout: no final status after {attempts} attempts")]
    PollingTimeout { attempts: u32 },
}

impl ExecutionError {
    /// Whether a retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Dispatch { transient, .. } | Self::StatusFetch { transient, .. } => *transient,
            Self::PollingTimeout { .. } => false,
        }
    }
}

/// Reasons a submission is refused before any evaluation starts.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Evaluation queue is full, try again later")]
    Saturated,

    #[error("Evaluation is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Store(#[from] StoreError),
}
