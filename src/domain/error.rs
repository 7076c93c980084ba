//! # Error Taxonomy
//!
//! Request-level failures of the orchestrator and failures reported by the workflow backend.
//! Per-action failures never surface here; they become entries of the execution log.

use thiserror::Error;

/// Failures that end a request without an answer.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("question is required.")]
    EmptyQuestion,
    #[error("A workflow credential is required.")]
    MissingCredential,
    #[error("The model returned an unusable plan: {0}")]
    PlanParse(String),
    #[error("The language model is unreachable: {0}")]
    ModelUnreachable(String),
}

impl OrchestratorError {
    /// Input errors are the caller's fault; everything else is an upstream failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            OrchestratorError::EmptyQuestion | OrchestratorError::MissingCredential
        )
    }
}

/// Error talking to the workflow backend.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub status: Option<u16>,
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}
