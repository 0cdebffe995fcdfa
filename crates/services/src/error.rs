//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::SessionResultError;
use storage::repository::StorageError;

/// Errors emitted by the quiz session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available")]
    Empty,

    #[error("session already completed")]
    Completed,

    #[error("session is not complete yet")]
    NotComplete,

    #[error(transparent)]
    Result(#[from] SessionResultError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the login/liveness gate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GateError {
    #[error("invalid username or password: {message}")]
    InvalidCredentials { message: String },

    #[error("liveness was not confirmed")]
    LivenessNotConfirmed,

    #[error("gate request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
