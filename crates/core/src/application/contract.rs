// Runtime adapter contract: acquire inputs -> compute -> emit one line
use std::io::Write;
use tracing::{debug, info};

use super::compute::Calculator;
use crate::domain::{DomainError, InputEnvelope, JsonMap, OutputEnvelope};
use crate::error::{AppError, Result};
use crate::port::InputSource;

/// Read and parse the input envelope from `source`
///
/// # Errors
/// - AppError::Io if the source cannot be read
/// - AppError::Domain if the text is empty or not a valid envelope
pub fn try_acquire_inputs(source: &dyn InputSource) -> Result<InputEnvelope> {
    match source.read_raw()? {
        Some(raw) => Ok(InputEnvelope::parse(&raw, source.framing())?),
        None => Ok(InputEnvelope::default()),
    }
}

/// Read the input envelope, collapsing every failure to an empty mapping
///
/// An absent, empty or malformed envelope is not an error for a worker;
/// it simply runs with no inputs.
pub fn acquire_inputs(source: &dyn InputSource) -> InputEnvelope {
    match try_acquire_inputs(source) {
        Ok(inputs) => {
            debug!(source = %source.describe(), keys = inputs.len(), "Inputs acquired");
            inputs
        }
        Err(AppError::Domain(DomainError::EmptyInput)) => {
            debug!(source = %source.describe(), "Empty input, using empty mapping");
            InputEnvelope::default()
        }
        Err(e) => {
            info!(source = %source.describe(), error = %e, "Unusable input, using empty mapping");
            InputEnvelope::default()
        }
    }
}

/// Wrap `outputs` in an envelope and write it as a single line
pub fn emit_outputs<W: Write>(writer: &mut W, outputs: JsonMap) -> Result<OutputEnvelope> {
    let envelope = OutputEnvelope::new(outputs);
    let line = envelope.to_line()?;
    writeln!(writer, "{}", line)?;
    writer.flush()?;
    Ok(envelope)
}

/// One worker invocation: read once, compute once, print once
pub struct WorkerContract {
    source: Box<dyn InputSource>,
    calculator: Calculator,
}

impl WorkerContract {
    pub fn new(source: Box<dyn InputSource>, calculator: Calculator) -> Self {
        Self { source, calculator }
    }

    /// Build the output envelope without writing it
    pub fn respond(&self) -> OutputEnvelope {
        let inputs = acquire_inputs(self.source.as_ref());
        OutputEnvelope::new(self.calculator.compute(&inputs))
    }

    /// Build the output envelope and write it to `writer`
    ///
    /// # Errors
    /// - AppError::Io if the line cannot be written
    pub fn run<W: Write>(&self, writer: &mut W) -> Result<OutputEnvelope> {
        let envelope = self.respond();
        emit_outputs(writer, envelope.outputs)
    }
}
