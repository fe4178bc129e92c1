// Compute engine: applies an Operation to the envelope's numeric data
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::constants::{DEFAULT_OPERATION, FILTER_THRESHOLD, NO_DATA_MESSAGE, RUNTIME_NAME};
use crate::domain::{InputEnvelope, JsonMap, Number, Numbers, Operation};
use crate::port::TimeProvider;

/// Computes the output mapping for an input envelope
///
/// Never fails: unknown operations and invalid data are reported inside
/// the returned mapping or replaced by defaults.
pub struct Calculator {
    time_provider: Arc<dyn TimeProvider>,
    default_operation: Operation,
}

impl Calculator {
    /// Create a calculator using `sum` when no operation is requested
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            time_provider,
            default_operation: DEFAULT_OPERATION,
        }
    }

    pub fn with_default_operation(mut self, operation: Operation) -> Self {
        self.default_operation = operation;
        self
    }

    pub fn default_operation(&self) -> &Operation {
        &self.default_operation
    }

    /// Build the output mapping for `inputs`
    ///
    /// - `operation` absent: the default operation applies
    /// - `data` absent, null or not numeric: the empty sequence applies
    /// - `test_param` present: echoed back as `message`
    pub fn compute(&self, inputs: &InputEnvelope) -> JsonMap {
        let operation = inputs
            .operation()
            .unwrap_or_else(|| self.default_operation.clone());

        let data = inputs.data().unwrap_or_else(|e| {
            info!(error = %e, "Ignoring invalid data, using empty sequence");
            Numbers::default()
        });

        let mut outputs = self.apply(&operation, &data);

        if let Some(param) = inputs.test_param() {
            outputs.insert(
                "message".to_string(),
                Value::String(format!("Received input: {}", param)),
            );
        }

        debug!(
            operation = %operation,
            input_count = data.len(),
            supported = operation.is_supported(),
            "Computed outputs"
        );

        outputs
    }

    /// Apply a single operation to a sequence
    pub fn apply(&self, operation: &Operation, data: &Numbers) -> JsonMap {
        match operation {
            Operation::Analyze => {
                let mut outputs = self.runtime_header(data);
                outputs.insert("analysis".to_string(), analyze(data));
                outputs
            }
            Operation::Transform => {
                let mut outputs = self.runtime_header(data);
                outputs.insert("transformed_data".to_string(), data.doubled().to_value());
                outputs
            }
            Operation::Filter => {
                let mut outputs = self.runtime_header(data);
                outputs.insert(
                    "filtered_data".to_string(),
                    data.above(FILTER_THRESHOLD).to_value(),
                );
                outputs
            }
            Operation::Sum => aggregate(operation, data.sum().to_value(), data),
            Operation::Average => {
                let value = data.mean().map(Value::from).unwrap_or_else(|| json!(0));
                aggregate(operation, value, data)
            }
            Operation::Max => {
                let value = data.max().map(Number::to_value).unwrap_or_else(|| json!(0));
                aggregate(operation, value, data)
            }
            Operation::Min => {
                let value = data.min().map(Number::to_value).unwrap_or_else(|| json!(0));
                aggregate(operation, value, data)
            }
            Operation::Unsupported(name) => {
                let mut outputs = JsonMap::new();
                outputs.insert(
                    "error".to_string(),
                    Value::String(format!("Unknown operation: {}", name)),
                );
                outputs.insert("operation".to_string(), Value::String(name.clone()));
                append_input_summary(&mut outputs, data);
                outputs
            }
        }
    }

    /// `runtime`, `version`, `timestamp`, `input_size`
    fn runtime_header(&self, data: &Numbers) -> JsonMap {
        let timestamp = chrono::DateTime::from_timestamp_millis(self.time_provider.now_millis())
            .unwrap_or_default()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut outputs = JsonMap::new();
        outputs.insert("runtime".to_string(), json!(RUNTIME_NAME));
        outputs.insert("version".to_string(), json!(crate::VERSION));
        outputs.insert("timestamp".to_string(), json!(timestamp));
        outputs.insert("input_size".to_string(), json!(data.len()));
        outputs
    }
}

fn analyze(data: &Numbers) -> Value {
    match (data.mean(), data.min(), data.max()) {
        (Some(mean), Some(min), Some(max)) => json!({
            "sum": data.sum().to_value(),
            "mean": mean,
            "min": min.to_value(),
            "max": max.to_value(),
            "count": data.len(),
        }),
        _ => json!({ "error": NO_DATA_MESSAGE }),
    }
}

/// `value`, `operation`, `input_count`, `input_data`
fn aggregate(operation: &Operation, value: Value, data: &Numbers) -> JsonMap {
    let mut outputs = JsonMap::new();
    outputs.insert("value".to_string(), value);
    outputs.insert("operation".to_string(), json!(operation.name()));
    append_input_summary(&mut outputs, data);
    outputs
}

fn append_input_summary(outputs: &mut JsonMap, data: &Numbers) {
    outputs.insert("input_count".to_string(), json!(data.len()));
    outputs.insert("input_data".to_string(), data.to_value());
}
