// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("Script failed (exit code {exit_code:?}): {message}")]
    ScriptFailed {
        exit_code: Option<i32>,
        message: String,
    },
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
