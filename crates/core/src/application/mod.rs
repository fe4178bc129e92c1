// Application Layer - Use Cases

pub mod compute;
pub mod constants;
pub mod contract;
pub mod step_runner;

// Re-exports
pub use compute::Calculator;
pub use contract::{acquire_inputs, emit_outputs, try_acquire_inputs, WorkerContract};
pub use step_runner::{StepResult, StepRunner};
