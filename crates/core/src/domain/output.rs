// Step Output Domain Model

use serde_json::Value;

use super::envelope::JsonMap;

/// What a script printed on stdout, classified
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    /// `{"outputs": {...}}` - the contract was honored
    Envelope(JsonMap),
    /// A JSON object printed without the envelope
    Bare(JsonMap),
    /// Anything that is not a JSON object
    Raw(String),
}

impl StepOutput {
    /// Classify captured stdout
    ///
    /// The whole trimmed text is tried first, then its last non-empty line,
    /// so scripts that print progress before the envelope still parse.
    pub fn parse(stdout: &str) -> Self {
        let trimmed = stdout.trim();

        let object = parse_object(trimmed).or_else(|| {
            trimmed
                .lines()
                .rev()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .and_then(parse_object)
        });

        match object {
            Some(mut map) => match map.remove("outputs") {
                Some(Value::Object(outputs)) => StepOutput::Envelope(outputs),
                Some(other) => {
                    map.insert("outputs".to_string(), other);
                    StepOutput::Bare(map)
                }
                None => StepOutput::Bare(map),
            },
            None => StepOutput::Raw(trimmed.to_string()),
        }
    }

    pub fn is_envelope(&self) -> bool {
        matches!(self, StepOutput::Envelope(_))
    }

    /// Output values as a mapping; raw text lands under `output`
    pub fn into_map(self) -> JsonMap {
        match self {
            StepOutput::Envelope(map) | StepOutput::Bare(map) => map,
            StepOutput::Raw(text) => {
                let mut map = JsonMap::new();
                map.insert("output".to_string(), Value::String(text));
                map
            }
        }
    }
}

fn parse_object(text: &str) -> Option<JsonMap> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
