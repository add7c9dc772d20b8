use thiserror::Error;

use crate::llm::LlmError;

/// Errors surfaced by the interview orchestrator to its caller.
#[derive(Debug, Error)]
pub enum InterviewError {
    /// The caller sent an unusable request; no provider was called.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every configured provider failed or none is configured.
    #[error(transparent)]
    Provider(#[from] LlmError),
}

/// Errors from the persistence collaborator.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("persistence connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}
