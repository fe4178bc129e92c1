//! Logging setup for `laq`
//!
//! Same filter and formats as the worker; events go to stderr so
//! `--json` output stays machine-readable.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lacquer_core::application::constants::DEFAULT_LOG_FILTER;

fn env_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?)
}

/// Initialize the global subscriber (`json` or compact lines)
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
