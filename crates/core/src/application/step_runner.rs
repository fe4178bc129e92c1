// Step runner: host side of the envelope contract
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{JsonMap, ScriptErrorReport, ScriptRequest, StepOutput};
use crate::error::{AppError, Result};
use crate::port::{ExecutionResult, ExecutionStatus, ScriptExecutor};

/// Outcome of one successful script run
#[derive(Debug, Clone)]
pub struct StepResult {
    pub output: StepOutput,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl StepResult {
    /// Output values as a mapping (raw text lands under `output`)
    pub fn outputs(&self) -> JsonMap {
        self.output.clone().into_map()
    }
}

/// Runs scripts through a ScriptExecutor and decodes their output envelope
pub struct StepRunner {
    executor: Arc<dyn ScriptExecutor>,
    default_timeout_ms: Option<i64>,
}

impl StepRunner {
    pub fn new(executor: Arc<dyn ScriptExecutor>) -> Self {
        Self {
            executor,
            default_timeout_ms: None,
        }
    }

    /// Timeout applied to requests that do not set their own
    pub fn with_default_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.default_timeout_ms = Some(timeout_ms);
        self
    }

    /// Run a script and parse what it printed
    ///
    /// # Errors
    /// - AppError::Execution if the script could not run to completion
    /// - AppError::ScriptFailed if the script exited non-zero
    pub async fn run(&self, mut request: ScriptRequest) -> Result<StepResult> {
        if request.timeout_ms.is_none() {
            request.timeout_ms = self.default_timeout_ms;
        }

        info!(
            script = %request.label(),
            runtime = %request.runtime,
            input_keys = request.inputs.len(),
            timeout_ms = ?request.timeout_ms,
            "Running script step"
        );

        let result = self.executor.execute(&request).await?;

        if result.status == ExecutionStatus::Failed {
            let message = failure_message(&result);
            warn!(
                script = %request.label(),
                exit_code = ?result.exit_code,
                message = %message,
                "Script step failed"
            );
            return Err(AppError::ScriptFailed {
                exit_code: result.exit_code,
                message,
            });
        }

        let output = StepOutput::parse(&result.stdout);
        if !output.is_envelope() {
            warn!(
                script = %request.label(),
                "Script did not print an output envelope, using its stdout as-is"
            );
        }

        Ok(StepResult {
            output,
            duration_ms: result.duration_ms,
            exit_code: result.exit_code,
            stderr: result.stderr,
        })
    }
}

/// Best description of why a script failed
///
/// Prefers a structured `{"message": ...}` report on stderr, then raw
/// stderr, then stdout.
fn failure_message(result: &ExecutionResult) -> String {
    let stderr = result.stderr.trim();
    if !stderr.is_empty() {
        return ScriptErrorReport::parse(stderr)
            .map(|report| report.message)
            .unwrap_or_else(|| stderr.to_string());
    }

    let stdout = result.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }

    match result.exit_code {
        Some(code) => format!("script exited with status {}", code),
        None => "script terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InputEnvelope, Runtime};
    use crate::port::script_executor::mocks::{MockBehavior, MockScriptExecutor};
    use crate::port::ExecutionError;
    use serde_json::json;

    fn request() -> ScriptRequest {
        ScriptRequest::inline(Runtime::Python, "step", "print('hi')").with_inputs(
            InputEnvelope::from_value(json!({"data": [1, 2], "operation": "sum"})).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_envelope_output() {
        let executor = Arc::new(MockScriptExecutor::new_success(
            "{\"outputs\": {\"value\": 3}}\n",
        ));
        let runner = StepRunner::new(executor.clone());

        let result = runner.run(request()).await.unwrap();

        assert!(result.output.is_envelope());
        assert_eq!(result.outputs()["value"], json!(3));
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_default_timeout_is_applied() {
        let executor = Arc::new(MockScriptExecutor::new_success("{}"));
        let runner = StepRunner::new(executor.clone()).with_default_timeout_ms(1234);

        runner.run(request()).await.unwrap();
        assert_eq!(executor.last_request().unwrap().timeout_ms, Some(1234));

        runner.run(request().with_timeout_ms(99)).await.unwrap();
        assert_eq!(executor.last_request().unwrap().timeout_ms, Some(99));
    }

    #[tokio::test]
    async fn test_inputs_reach_executor() {
        let executor = Arc::new(MockScriptExecutor::new_success("{}"));
        StepRunner::new(executor.clone())
            .run(request())
            .await
            .unwrap();

        let seen = executor.last_request().unwrap();
        assert_eq!(seen.inputs.get("operation"), Some(&json!("sum")));
    }

    #[tokio::test]
    async fn test_raw_output() {
        let executor = Arc::new(MockScriptExecutor::new_success("plain text\n"));
        let result = StepRunner::new(executor).run(request()).await.unwrap();

        assert_eq!(result.output, StepOutput::Raw("plain text".to_string()));
        assert_eq!(result.outputs()["output"], json!("plain text"));
    }

    #[tokio::test]
    async fn test_structured_stderr_message() {
        let executor = Arc::new(MockScriptExecutor::new_fail(
            2,
            r#"{"message": "missing field: data", "code": "INPUT"}"#,
        ));
        let err = StepRunner::new(executor).run(request()).await.unwrap_err();

        match err {
            AppError::ScriptFailed { exit_code, message } => {
                assert_eq!(exit_code, Some(2));
                assert_eq!(message, "missing field: data");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plain_stderr_message() {
        let executor = Arc::new(MockScriptExecutor::new_fail(1, "Traceback: boom\n"));
        let err = StepRunner::new(executor).run(request()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::ScriptFailed { ref message, .. } if message == "Traceback: boom"
        ));
    }

    #[tokio::test]
    async fn test_executor_errors_propagate() {
        let executor = Arc::new(MockScriptExecutor::new(MockBehavior::Timeout(500)));
        let err = StepRunner::new(executor).run(request()).await.unwrap_err();
        assert!(matches!(err, AppError::Execution(ExecutionError::Timeout(500))));

        let executor = Arc::new(MockScriptExecutor::new(MockBehavior::SpawnError(
            "python3 not found".to_string(),
        )));
        let err = StepRunner::new(executor).run(request()).await.unwrap_err();
        assert!(matches!(err, AppError::Execution(ExecutionError::SpawnFailed(_))));
    }

    #[test]
    fn test_failure_message_fallbacks() {
        let mut result = ExecutionResult {
            status: ExecutionStatus::Failed,
            duration_ms: 1,
            exit_code: Some(3),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(failure_message(&result), "script exited with status 3");

        result.stdout = "partial output".to_string();
        assert_eq!(failure_message(&result), "partial output");

        result.exit_code = None;
        result.stdout.clear();
        assert_eq!(failure_message(&result), "script terminated by signal");
    }
}
