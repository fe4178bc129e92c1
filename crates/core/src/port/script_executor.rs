// Script Executor Port
// Abstraction for running a script under a language runtime

use crate::domain::ScriptRequest;
use async_trait::async_trait;
use thiserror::Error;

/// Result of script execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process timeout after {0}ms")]
    Timeout(i64),

    #[error("Process killed: {0}")]
    Killed(String),

    #[error("Script preparation failed: {0}")]
    Preparation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Script Executor trait
///
/// Implementations:
/// - SubprocessExecutor: spawns the runtime as a child process
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run a script and collect its output
    ///
    /// A script that exits non-zero is NOT an error here; it comes back as
    /// `ExecutionStatus::Failed` so the caller can inspect stderr.
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the runtime cannot be started
    /// - ExecutionError::Timeout if execution exceeds the request timeout
    /// - ExecutionError::Preparation if an inline script cannot be cached
    async fn execute(&self, request: &ScriptRequest) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0 with the given stdout
        Success(String),
        /// Exit with code and stderr
        Fail { exit_code: i32, stderr: String },
        /// Runtime could not be started
        SpawnError(String),
        /// Timeout after N ms
        Timeout(i64),
    }

    /// Mock Script Executor for testing
    pub struct MockScriptExecutor {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
        last_request: Arc<Mutex<Option<ScriptRequest>>>,
    }

    impl MockScriptExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
                last_request: Arc::new(Mutex::new(None)),
            }
        }

        pub fn new_success(stdout: impl Into<String>) -> Self {
            Self::new(MockBehavior::Success(stdout.into()))
        }

        pub fn new_fail(exit_code: i32, stderr: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail {
                exit_code,
                stderr: stderr.into(),
            })
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }

        pub fn last_request(&self) -> Option<ScriptRequest> {
            self.last_request.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScriptExecutor for MockScriptExecutor {
        async fn execute(
            &self,
            request: &ScriptRequest,
        ) -> Result<ExecutionResult, ExecutionError> {
            *self.call_count.lock().unwrap() += 1;
            *self.last_request.lock().unwrap() = Some(request.clone());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Success(stdout) => Ok(ExecutionResult {
                    status: ExecutionStatus::Success,
                    duration_ms: 100,
                    exit_code: Some(0),
                    stdout,
                    stderr: String::new(),
                }),
                MockBehavior::Fail { exit_code, stderr } => Ok(ExecutionResult {
                    status: ExecutionStatus::Failed,
                    duration_ms: 100,
                    exit_code: Some(exit_code),
                    stdout: String::new(),
                    stderr,
                }),
                MockBehavior::SpawnError(msg) => Err(ExecutionError::SpawnFailed(msg)),
                MockBehavior::Timeout(ms) => Err(ExecutionError::Timeout(ms)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::{MockBehavior, MockScriptExecutor};
    use super::*;
    use crate::domain::Runtime;
    use tokio_test::{assert_err, assert_ok, block_on};

    #[test]
    fn test_mock_records_calls() {
        let executor = MockScriptExecutor::new_success("{}");
        let request = ScriptRequest::inline(Runtime::Bash, "noop", "true");

        let result = assert_ok!(block_on(executor.execute(&request)));
        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(executor.call_count(), 1);
        assert_eq!(executor.last_request().map(|r| r.label()), Some("inline:noop".to_string()));
    }

    #[test]
    fn test_mock_timeout_is_error() {
        let executor = MockScriptExecutor::new(MockBehavior::Timeout(250));
        let request = ScriptRequest::inline(Runtime::Bash, "slow", "sleep 1");

        let err = assert_err!(block_on(executor.execute(&request)));
        assert_eq!(err.to_string(), "Process timeout after 250ms");
    }
}
