// Lacquer Infrastructure - System Adapters
// Implements: InputSource, ScriptExecutor

pub mod input_source;
pub mod launcher;
pub mod script_cache;
pub mod subprocess_executor;

pub use input_source::{
    process_env, select_input_source, select_input_source_with, EnvInputSource, EnvLookup,
    InputMode, ReaderInputSource, StdinInputSource,
};
pub use launcher::{LaunchCommand, Launcher};
pub use script_cache::ScriptCache;
pub use subprocess_executor::SubprocessExecutor;
