// Subprocess script executor
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use lacquer_core::application::constants::{GRACEFUL_SHUTDOWN_TIMEOUT_MS, KILL_POLL_INTERVAL};
use lacquer_core::domain::{ExecutionInput, ScriptRequest, ScriptSource, INPUTS_ENV_VAR};
use lacquer_core::port::script_executor::{
    ExecutionError, ExecutionResult, ExecutionStatus, ScriptExecutor,
};
use lacquer_core::port::TimeProvider;

use crate::launcher::{LaunchCommand, Launcher};
use crate::script_cache::ScriptCache;

/// Subprocess executor
///
/// Launches the script's runtime as a child process with an allowlisted
/// environment. Inputs are delivered twice: as `LACQUER_INPUTS` (the plain
/// mapping) and on stdin as `{"inputs": {...}}`.
pub struct SubprocessExecutor {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
    cache: ScriptCache,
    launcher: Launcher,
    grace_ms: i64,
}

impl SubprocessExecutor {
    /// Create a new subprocess executor
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `env_allowlist` - Parent environment variables passed to scripts
    /// * `cache_dir` - Where inline scripts are written before launch
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new(
    ///     Arc::new(SystemTimeProvider),
    ///     vec!["PATH".to_string(), "HOME".to_string()],
    ///     "/tmp/lacquer-scripts",
    /// );
    /// ```
    pub fn new(
        time_provider: Arc<dyn TimeProvider>,
        env_allowlist: Vec<String>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            time_provider,
            env_allowlist,
            cache: ScriptCache::new(cache_dir),
            launcher: Launcher::default(),
            grace_ms: GRACEFUL_SHUTDOWN_TIMEOUT_MS,
        }
    }

    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    /// How long a timed-out script gets between SIGTERM and SIGKILL
    pub fn with_grace_ms(mut self, grace_ms: i64) -> Self {
        self.grace_ms = grace_ms;
        self
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        env.iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Child environment: allowlisted parent vars, WORKSPACE, request env,
    /// then LACQUER_INPUTS (which the request cannot override)
    fn build_env(&self, request: &ScriptRequest) -> Result<HashMap<String, String>, ExecutionError> {
        let parent: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let mut env = self.filter_env(&parent);

        env.insert(
            "WORKSPACE".to_string(),
            request.working_dir.display().to_string(),
        );
        env.extend(request.env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let inputs_json = request
            .inputs
            .to_json()
            .map_err(|e| ExecutionError::InvalidRequest(e.to_string()))?;
        env.insert(INPUTS_ENV_VAR.to_string(), inputs_json);

        Ok(env)
    }

    /// Resolve the script to a path on disk
    async fn prepare_script(&self, request: &ScriptRequest) -> Result<PathBuf, ExecutionError> {
        match &request.source {
            ScriptSource::File(path) => {
                let expanded =
                    PathBuf::from(shellexpand::tilde(&path.display().to_string()).into_owned());
                let resolved = if expanded.is_relative() {
                    request.working_dir.join(expanded)
                } else {
                    expanded
                };
                if !resolved.is_file() {
                    return Err(ExecutionError::Preparation(format!(
                        "script not found: {}",
                        resolved.display()
                    )));
                }
                Ok(resolved)
            }
            ScriptSource::Inline { name, body } => {
                if body.trim().is_empty() {
                    return Err(ExecutionError::InvalidRequest(format!(
                        "inline script '{}' is empty",
                        name
                    )));
                }
                self.cache
                    .get_or_write(name, body, request.runtime)
                    .await
                    .map_err(|e| ExecutionError::Preparation(e.to_string()))
            }
        }
    }

    /// Spawn child process, feed stdin and wait for output
    ///
    /// The timeout covers the whole run: process exit and both output
    /// pipes. A background process still holding stdout open counts as
    /// running.
    async fn spawn_and_wait(
        &self,
        command: &LaunchCommand,
        env: &HashMap<String, String>,
        request: &ScriptRequest,
    ) -> Result<(ExitStatus, Vec<u8>, Vec<u8>), ExecutionError> {
        let stdin_payload = serde_json::to_vec(&ExecutionInput::new(&request.inputs))
            .map_err(|e| ExecutionError::InvalidRequest(e.to_string()))?;

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .env_clear()
            .envs(env)
            .current_dir(&request.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout reaches everything the script started
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", command.program, e)))?;
        let pid = child.id();

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                // Scripts that only read LACQUER_INPUTS may exit before consuming stdin
                if let Err(e) = stdin.write_all(&stdin_payload).await {
                    debug!(error = %e, "Script did not consume stdin");
                }
            });
        }

        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());

        let collect = async {
            let status = child
                .wait()
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string()))?;
            let stdout = join_reader(stdout_task).await?;
            let stderr = join_reader(stderr_task).await?;
            Ok::<_, ExecutionError>((status, stdout, stderr))
        };

        let Some(timeout_ms) = request.timeout_ms else {
            return collect.await;
        };

        let deadline = Instant::now() + Duration::from_millis(timeout_ms.max(0) as u64);
        match timeout_at(deadline, collect).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    script = %request.label(),
                    timeout_ms = timeout_ms,
                    "Script timed out, terminating"
                );
                self.terminate(&mut child, pid).await?;
                Err(ExecutionError::Timeout(timeout_ms))
            }
        }
    }

    /// Stop the script's process group: SIGTERM, wait up to the grace
    /// period, then SIGKILL
    async fn terminate(&self, child: &mut Child, pid: Option<u32>) -> Result<(), ExecutionError> {
        #[cfg(unix)]
        if let Some(pid) = pid {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            let group = Pid::from_raw(pid as i32);
            info!(pgid = %pid, "Sending SIGTERM to script process group");
            if let Err(e) = killpg(group, Signal::SIGTERM) {
                debug!(pgid = %pid, error = %e, "SIGTERM failed, group likely gone");
            }

            let start_time = self.time_provider.now_millis();
            loop {
                // Reap the direct child so it does not linger as a zombie member
                let _ = child.try_wait();

                if killpg(group, None::<Signal>).is_err() {
                    info!(pgid = %pid, "Process group exited after SIGTERM");
                    return Ok(());
                }

                if self.time_provider.now_millis() - start_time > self.grace_ms {
                    warn!(pgid = %pid, "Process group still alive after SIGTERM, sending SIGKILL");
                    if let Err(e) = killpg(group, Signal::SIGKILL) {
                        debug!(pgid = %pid, error = %e, "SIGKILL failed, group likely gone");
                    }
                    break;
                }

                tokio::time::sleep(KILL_POLL_INTERVAL).await;
            }
        }

        #[cfg(not(unix))]
        let _ = pid;

        if let Ok(Some(_)) = child.try_wait() {
            return Ok(());
        }
        child
            .kill()
            .await
            .map_err(|e| ExecutionError::Killed(e.to_string()))
    }

    /// Build execution result from process output
    fn build_result(
        &self,
        status: ExitStatus,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        duration_ms: i64,
    ) -> ExecutionResult {
        let execution_status = if status.success() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };

        ExecutionResult {
            status: execution_status,
            exit_code: status.code(),
            duration_ms,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        }
    }
}

type ReaderTask = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

fn spawn_reader<R>(pipe: Option<R>) -> ReaderTask
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pipe.map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).await?;
            Ok(buf)
        })
    })
}

async fn join_reader(task: ReaderTask) -> Result<Vec<u8>, ExecutionError> {
    match task {
        Some(handle) => handle
            .await
            .map_err(|e| ExecutionError::IoError(e.to_string()))?
            .map_err(|e| ExecutionError::IoError(e.to_string())),
        None => Ok(Vec::new()),
    }
}

#[async_trait]
impl ScriptExecutor for SubprocessExecutor {
    async fn execute(&self, request: &ScriptRequest) -> Result<ExecutionResult, ExecutionError> {
        let script_path = self.prepare_script(request).await?;
        let command = self.launcher.command_for(request.runtime, &script_path);
        let env = self.build_env(request)?;

        let start_time = self.time_provider.now_millis();

        info!(
            program = %command.program,
            args = ?command.args,
            working_dir = %request.working_dir.display(),
            timeout_ms = ?request.timeout_ms,
            "Starting script execution"
        );

        let (status, stdout, stderr) = self.spawn_and_wait(&command, &env, request).await?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = self.build_result(status, stdout, stderr, duration_ms);

        info!(
            program = %command.program,
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "Script execution completed"
        );

        Ok(result)
    }
}
