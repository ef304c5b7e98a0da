//! Centralized error types for TaskFlow.

use thiserror::Error;

use crate::validate::FieldErrors;

/// Main error type for TaskFlow operations.
#[derive(Error, Debug)]
pub enum TaskFlowError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("{0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for TaskFlow operations.
pub type Result<T> = std::result::Result<T, TaskFlowError>;

impl TaskFlowError {
    /// Create a not-found error for a task id.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a remote collaborator error.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Field errors carried by a validation failure, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
