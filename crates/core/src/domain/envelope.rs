// Envelope Domain Model
//
// Wire forms exchanged between the orchestrator and a worker process:
// - LACQUER_INPUTS env var: `{"data": [...], "operation": "sum"}`
// - stdin:                  `{"inputs": {...}}`
// - stdout:                 `{"outputs": {...}}` (one line)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{DomainError, Result};
use super::number::Numbers;
use super::operation::Operation;

/// Environment variable carrying the JSON-encoded input mapping
pub const INPUTS_ENV_VAR: &str = "LACQUER_INPUTS";

/// JSON object with string keys (insertion ordered)
pub type JsonMap = serde_json::Map<String, Value>;

/// How raw input text is framed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// The mapping itself (environment variable form)
    Plain,
    /// The mapping under an `inputs` key (stdin form)
    Wrapped,
}

/// Input Envelope: the task parameters handed to a worker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputEnvelope(JsonMap);

impl InputEnvelope {
    pub fn new(map: JsonMap) -> Self {
        Self(map)
    }

    /// Build from a JSON value that must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::InvalidEnvelope(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse raw text according to its framing
    ///
    /// # Errors
    /// - DomainError::EmptyInput if the text is blank
    /// - DomainError::MalformedJson if the text is not JSON
    /// - DomainError::InvalidEnvelope if the JSON has the wrong shape
    pub fn parse(raw: &str, framing: Framing) -> Result<Self> {
        match framing {
            Framing::Plain => Self::parse_plain(raw),
            Framing::Wrapped => Self::parse_wrapped(raw),
        }
    }

    /// Parse the plain mapping form
    ///
    /// A mapping whose only key is an object-valued `inputs` is unwrapped,
    /// since some callers send the stdin form through the variable.
    pub fn parse_plain(raw: &str) -> Result<Self> {
        let value = parse_json(raw)?;
        let envelope = Self::from_value(value)?;

        if envelope.0.len() == 1 {
            if let Some(Value::Object(inner)) = envelope.0.get("inputs") {
                return Ok(Self(inner.clone()));
            }
        }
        Ok(envelope)
    }

    /// Parse the `{"inputs": {...}}` form; a missing or null `inputs` is empty
    pub fn parse_wrapped(raw: &str) -> Result<Self> {
        let value = parse_json(raw)?;
        let wrapper: ExecutionInput = serde_json::from_value(value)
            .map_err(|e| DomainError::InvalidEnvelope(e.to_string()))?;
        Ok(Self(wrapper.inputs))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }

    pub fn into_map(self) -> JsonMap {
        self.0
    }

    /// Requested operation, None when the key is absent
    ///
    /// A non-string value is treated as an unsupported operation named by
    /// its JSON text.
    pub fn operation(&self) -> Option<Operation> {
        match self.0.get("operation")? {
            Value::Null => None,
            Value::String(name) => Some(Operation::parse(name)),
            other => Some(Operation::Unsupported(other.to_string())),
        }
    }

    /// Numeric `data` sequence; absent or null is empty
    pub fn data(&self) -> Result<Numbers> {
        match self.0.get("data") {
            None | Some(Value::Null) => Ok(Numbers::default()),
            Some(value) => Numbers::from_value(value),
        }
    }

    pub fn test_param(&self) -> Option<&str> {
        self.0.get("test_param").and_then(|v| v.as_str())
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl From<JsonMap> for InputEnvelope {
    fn from(map: JsonMap) -> Self {
        Self(map)
    }
}

/// Stdin wire form: `{"inputs": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionInput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub inputs: JsonMap,
}

impl ExecutionInput {
    pub fn new(inputs: &InputEnvelope) -> Self {
        Self {
            inputs: inputs.as_map().clone(),
        }
    }
}

/// Output Envelope: `{"outputs": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputEnvelope {
    pub outputs: JsonMap,
}

impl OutputEnvelope {
    pub fn new(outputs: JsonMap) -> Self {
        Self { outputs }
    }

    /// Serialize to a single line of JSON (no trailing newline)
    pub fn to_line(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Structured error a failing script may print on stderr
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptErrorReport {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonMap>,
}

impl ScriptErrorReport {
    /// Parse stderr text as a structured report, None when it is not one
    pub fn parse(stderr: &str) -> Option<Self> {
        serde_json::from_str(stderr.trim()).ok()
    }
}

fn parse_json(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Err(DomainError::EmptyInput);
    }
    serde_json::from_str(raw).map_err(|e| DomainError::MalformedJson(e.to_string()))
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<JsonMap, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<JsonMap>::deserialize(deserializer)?.unwrap_or_default())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
