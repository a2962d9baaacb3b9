//! Core error types.

use specdown_parser::ParseError;
use thiserror::Error;

/// Errors returned by the workspace-level operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file exceeds the configured size limit.
    #[error("File is too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// A delta cannot be applied to its base spec.
    #[error("Merge error: {0}")]
    Merge(String),

    /// Task store error.
    #[error("Task store error: {0}")]
    TaskStore(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a merge error.
    pub fn merge(message: impl Into<String>) -> Self {
        Self::Merge(message.into())
    }

    /// Creates a task store error.
    pub fn task_store(message: impl Into<String>) -> Self {
        Self::TaskStore(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
