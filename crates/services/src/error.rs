//! Shared error types for the services crate.

use thiserror::Error;

use assess_core::model::{CandidateError, ScoreError};
use storage::repository::{LoadError, StorageError};

/// Errors emitted by `TestSession` commands. None of them change session state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] CandidateError),
    #[error("session has already started")]
    AlreadyStarted,
    #[error("session has not started")]
    NotStarted,
    #[error("session is not in progress")]
    NotInProgress,
    #[error("session is paused")]
    Paused,
    #[error("session has not been submitted")]
    NotSubmitted,
    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Errors emitted by result sinks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("payload rejected: {0}")]
    Rejected(String),
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted by `AssessmentService`. Storage failures surface per sink
/// in `DispatchOutcome`, never here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted when talking to a running session task.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    #[error("session task is no longer running")]
    Closed,
    #[error(transparent)]
    Session(#[from] SessionError),
}
