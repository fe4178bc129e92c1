// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Empty input")]
    EmptyInput,

    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown runtime: {0}")]
    UnknownRuntime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
