// Domain Layer - Envelopes, operations and script descriptions

pub mod envelope;
pub mod error;
pub mod number;
pub mod operation;
pub mod output;
pub mod script;

// Re-exports
pub use envelope::{
    ExecutionInput, Framing, InputEnvelope, JsonMap, OutputEnvelope, ScriptErrorReport,
    INPUTS_ENV_VAR,
};
pub use error::DomainError;
pub use number::{Number, Numbers};
pub use operation::Operation;
pub use output::StepOutput;
pub use script::{Runtime, ScriptRequest, ScriptSource};
