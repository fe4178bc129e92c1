// Runtime constants (ADR: No magic values)
use std::time::Duration;

use crate::domain::Operation;

/// Operation used when the envelope carries no `operation` key
pub const DEFAULT_OPERATION: Operation = Operation::Sum;

/// `filter` keeps elements strictly greater than this
pub const FILTER_THRESHOLD: f64 = 10.0;

/// `analysis.error` text for an empty sequence
pub const NO_DATA_MESSAGE: &str = "No data provided";

/// Reported as `runtime` in analysis-style outputs
pub const RUNTIME_NAME: &str = "rust";

/// Parent environment variables passed through to scripts
pub const DEFAULT_ENV_ALLOWLIST: [&str; 4] = ["PATH", "HOME", "USER", "LOG_LEVEL"];

/// Default per-script timeout (5 minutes)
pub const DEFAULT_SCRIPT_TIMEOUT_MS: i64 = 5 * 60 * 1000;

/// Grace period between SIGTERM and SIGKILL (5 seconds)
pub const GRACEFUL_SHUTDOWN_TIMEOUT_MS: i64 = 5000;

/// Poll interval while waiting for a signalled process to exit
pub const KILL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Log filter used by the binaries when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "lacquer=warn";
