// Port Layer - Interfaces for external dependencies

pub mod input_source;
pub mod script_executor;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use input_source::InputSource;
pub use script_executor::{ExecutionError, ExecutionResult, ExecutionStatus, ScriptExecutor};
pub use time_provider::TimeProvider;
