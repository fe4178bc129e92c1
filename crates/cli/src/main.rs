//! Lacquer CLI - run scripts under the envelope contract

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::debug;

use lacquer_core::application::constants::{DEFAULT_ENV_ALLOWLIST, DEFAULT_SCRIPT_TIMEOUT_MS};
use lacquer_core::application::{Calculator, StepResult, StepRunner};
use lacquer_core::domain::{
    InputEnvelope, Operation, OutputEnvelope, Runtime, ScriptRequest, StepOutput,
};
use lacquer_core::port::time_provider::SystemTimeProvider;
use lacquer_infra_system::SubprocessExecutor;

const DEFAULT_CACHE_DIR: &str = "~/.lacquer/cache/scripts";

#[derive(Parser)]
#[command(name = "laq")]
#[command(about = "Lacquer script runtime CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log format written to stderr: pretty or json
    #[arg(long, global = true, env = "LACQUER_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script and print its outputs
    Run {
        /// Script file (runtime inferred from the extension)
        #[arg(required_unless_present = "code", conflicts_with = "code")]
        script: Option<PathBuf>,

        /// Inline script body instead of a file
        #[arg(long, requires = "runtime")]
        code: Option<String>,

        /// Runtime: python, node, bash, go or binary
        #[arg(short, long)]
        runtime: Option<Runtime>,

        /// Inputs as a JSON object
        #[arg(short, long)]
        inputs: Option<String>,

        /// Extra environment for the script (KEY=VALUE)
        #[arg(short = 'e', long = "env", value_parser = parse_key_val)]
        env: Vec<(String, String)>,

        /// Working directory for the script
        #[arg(long)]
        working_dir: Option<PathBuf>,

        /// Timeout in milliseconds
        #[arg(long, env = "LACQUER_TIMEOUT_MS", default_value_t = DEFAULT_SCRIPT_TIMEOUT_MS)]
        timeout_ms: i64,

        /// Directory for cached inline scripts
        #[arg(long, env = "LACQUER_SCRIPT_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
        cache_dir: String,

        /// Print the output envelope as one JSON line
        #[arg(long)]
        json: bool,
    },

    /// Apply an operation in-process and print the output envelope
    Compute {
        /// Operation name (analyze, transform, filter, sum, average, max, min)
        #[arg(short, long, default_value = "sum")]
        operation: String,

        /// Comma separated numbers
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        data: Vec<String>,

        /// Inputs as a JSON object (replaces --operation and --data)
        #[arg(short, long, conflicts_with_all = ["data", "operation"])]
        inputs: Option<String>,
    },

    /// List supported operations
    Operations,
}

#[derive(Tabled)]
struct OutputRow {
    key: String,
    value: String,
}

#[derive(Tabled)]
struct OperationRow {
    operation: String,
    result: String,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_inputs(raw: &str) -> Result<InputEnvelope> {
    InputEnvelope::parse_plain(raw).context("Invalid --inputs JSON")
}

/// Build the envelope for `compute` from flags
fn compute_inputs(operation: &str, data: &[String], inputs: Option<&str>) -> Result<InputEnvelope> {
    if let Some(raw) = inputs {
        return parse_inputs(raw);
    }

    let numbers = data
        .iter()
        .map(|item| {
            serde_json::from_str::<Value>(item.trim())
                .ok()
                .filter(Value::is_number)
                .with_context(|| format!("Not a number: '{}'", item))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut envelope = InputEnvelope::default();
    envelope.insert("data", Value::Array(numbers));
    envelope.insert("operation", Value::String(operation.to_string()));
    Ok(envelope)
}

fn infer_runtime(script: &Path) -> Runtime {
    script
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(Runtime::from_extension)
        .unwrap_or(Runtime::Binary)
}

fn print_outputs(result: &StepResult) {
    let headline = match &result.output {
        StepOutput::Envelope(_) => "✓ Script completed".green().bold(),
        StepOutput::Bare(_) => "✓ Script completed (no output envelope)".yellow().bold(),
        StepOutput::Raw(_) => "✓ Script completed (raw output)".yellow().bold(),
    };
    println!("{} in {} ms", headline, result.duration_ms);
    println!();

    let rows: Vec<OutputRow> = result
        .outputs()
        .into_iter()
        .map(|(key, value)| OutputRow {
            key,
            value: match value {
                Value::String(s) => s,
                other => other.to_string(),
            },
        })
        .collect();

    if rows.is_empty() {
        println!("{}", "No outputs".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(&cli.log_format)?;

    match cli.command {
        Commands::Run {
            script,
            code,
            runtime,
            inputs,
            env,
            working_dir,
            timeout_ms,
            cache_dir,
            json,
        } => {
            let mut request = match (script, code) {
                (Some(path), _) => {
                    let runtime = runtime.unwrap_or_else(|| infer_runtime(&path));
                    ScriptRequest::file(runtime, path)
                }
                (None, Some(code)) => match runtime {
                    Some(runtime) => ScriptRequest::inline(runtime, "cli", code),
                    None => bail!("--code requires --runtime"),
                },
                (None, None) => bail!("Either a script path or --code is required"),
            };

            if let Some(raw) = inputs {
                request = request.with_inputs(parse_inputs(&raw)?);
            }
            for (key, value) in env {
                request = request.with_env(key, value);
            }
            if let Some(dir) = working_dir {
                request = request.with_working_dir(dir);
            }
            request = request.with_timeout_ms(timeout_ms);

            debug!(
                script = %request.label(),
                runtime = %request.runtime,
                cache_dir = %cache_dir,
                "Prepared script request"
            );

            let executor = Arc::new(SubprocessExecutor::new(
                Arc::new(SystemTimeProvider),
                DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
                shellexpand::tilde(&cache_dir).into_owned(),
            ));

            let result = StepRunner::new(executor).run(request).await?;

            if json {
                println!("{}", OutputEnvelope::new(result.outputs()).to_line()?);
            } else {
                print_outputs(&result);
            }
        }

        Commands::Compute {
            operation,
            data,
            inputs,
        } => {
            let envelope = compute_inputs(&operation, &data, inputs.as_deref())?;
            let outputs = Calculator::new(Arc::new(SystemTimeProvider)).compute(&envelope);
            println!("{}", OutputEnvelope::new(outputs).to_line()?);
        }

        Commands::Operations => {
            let rows: Vec<OperationRow> = Operation::SUPPORTED
                .iter()
                .map(|op| OperationRow {
                    operation: op.name().to_string(),
                    result: op.description().to_string(),
                })
                .collect();

            println!("{}", "Supported operations".cyan().bold());
            println!();
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("A=1=2").unwrap(),
            ("A".to_string(), "1=2".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_compute_inputs_from_flags() {
        let envelope =
            compute_inputs("max", &["1".to_string(), " 2.5".to_string(), "-3".to_string()], None)
                .unwrap();
        assert_eq!(envelope.get("data"), Some(&json!([1, 2.5, -3])));
        assert_eq!(envelope.operation(), Some(Operation::Max));

        assert!(compute_inputs("sum", &["x".to_string()], None).is_err());
    }

    #[test]
    fn test_compute_inputs_from_json() {
        let envelope = compute_inputs("sum", &[], Some(r#"{"operation": "filter"}"#)).unwrap();
        assert_eq!(envelope.operation(), Some(Operation::Filter));

        assert!(compute_inputs("sum", &[], Some("[1]")).is_err());
    }

    #[test]
    fn test_compute_inputs_excludes_operation_and_data() {
        assert!(Cli::try_parse_from(["laq", "compute", "--inputs", "{}"]).is_ok());
        assert!(Cli::try_parse_from([
            "laq", "compute", "--operation", "median", "--inputs", "{}"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["laq", "compute", "-d", "1,2", "-i", "{}"]).is_err());
    }

    #[test]
    fn test_infer_runtime() {
        assert_eq!(infer_runtime(Path::new("steps/clean.py")), Runtime::Python);
        assert_eq!(infer_runtime(Path::new("run.sh")), Runtime::Bash);
        assert_eq!(infer_runtime(Path::new("./tool")), Runtime::Binary);
    }

    #[test]
    fn test_run_requires_script_or_code() {
        assert!(Cli::try_parse_from(["laq", "run"]).is_err());
        assert!(Cli::try_parse_from(["laq", "run", "--code", "echo hi"]).is_err());
        assert!(Cli::try_parse_from(["laq", "run", "--code", "echo hi", "-r", "bash"]).is_ok());
        assert!(Cli::try_parse_from(["laq", "run", "a.py", "--code", "x", "-r", "bash"]).is_err());
    }
}
