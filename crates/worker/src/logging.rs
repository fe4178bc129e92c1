//! Logging setup for the worker
//!
//! Stdout belongs to the output envelope, so every event goes to stderr.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lacquer_core::application::constants::DEFAULT_LOG_FILTER;

/// `RUST_LOG` when set, otherwise the shared quiet default
fn env_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?)
}

/// Initialize the global subscriber
///
/// # Formats
///
/// - `json`: one JSON object per event
/// - anything else: compact human-readable lines
pub fn init_logging(format: &str) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter()?);

    match format {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        _ => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(())
}
