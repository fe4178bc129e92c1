//! Lacquer Worker - Runtime Adapter Entry Point
//!
//! Reads the input envelope (LACQUER_INPUTS or stdin), computes the
//! requested operation and prints exactly one `{"outputs": {...}}` line.

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::debug;

use lacquer_core::application::{Calculator, WorkerContract};
use lacquer_core::domain::{Operation, INPUTS_ENV_VAR};
use lacquer_core::port::time_provider::SystemTimeProvider;
use lacquer_infra_system::{select_input_source, InputMode};

#[derive(Parser, Debug)]
#[command(name = "lacquer-worker")]
#[command(about = "Lacquer runtime adapter worker", long_about = None)]
#[command(version)]
struct Args {
    /// Where to read inputs from: auto, env or stdin
    #[arg(long, env = "LACQUER_INPUT_SOURCE", default_value = "auto")]
    input_source: InputMode,

    /// Environment variable holding the JSON input mapping
    #[arg(long, env = "LACQUER_INPUTS_VAR", default_value = INPUTS_ENV_VAR)]
    inputs_var: String,

    /// Operation applied when the inputs do not name one
    #[arg(long, env = "LACQUER_DEFAULT_OPERATION", default_value = "sum", value_parser = parse_operation)]
    default_operation: Operation,

    /// Log format written to stderr: pretty or json
    #[arg(long, env = "LACQUER_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

fn parse_operation(name: &str) -> Result<Operation, String> {
    Operation::parse_supported(name).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(&args.log_format)?;

    debug!(
        version = lacquer_core::VERSION,
        input_source = %args.input_source,
        inputs_var = %args.inputs_var,
        default_operation = %args.default_operation,
        "Worker starting"
    );

    let source = select_input_source(args.input_source, &args.inputs_var);
    let calculator =
        Calculator::new(Arc::new(SystemTimeProvider)).with_default_operation(args.default_operation);
    let contract = WorkerContract::new(source, calculator);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    contract
        .run(&mut out)
        .context("Failed to write output envelope")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operation_message() {
        assert_eq!(parse_operation("min").unwrap(), Operation::Min);

        let message = parse_operation("median").unwrap_err();
        assert!(message.contains("median"));
        assert!(message.contains("expected one of: analyze, transform"));
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["lacquer-worker"]).unwrap();
        assert_eq!(args.inputs_var, "LACQUER_INPUTS");
        assert_eq!(args.default_operation, Operation::Sum);
    }

    #[test]
    fn test_explicit_flags() {
        let args = Args::try_parse_from([
            "lacquer-worker",
            "--input-source",
            "stdin",
            "--default-operation",
            "analyze",
            "--inputs-var",
            "MY_INPUTS",
        ])
        .unwrap();

        assert_eq!(args.input_source, InputMode::Stdin);
        assert_eq!(args.default_operation, Operation::Analyze);
        assert_eq!(args.inputs_var, "MY_INPUTS");
    }

    #[test]
    fn test_rejects_unsupported_default_operation() {
        assert!(Args::try_parse_from(["lacquer-worker", "--default-operation", "median"]).is_err());
        assert!(Args::try_parse_from(["lacquer-worker", "--input-source", "socket"]).is_err());
    }
}
