// Script Domain Model (host side)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use super::envelope::InputEnvelope;
use super::error::DomainError;

/// Language runtime a script is launched with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Python,
    Node,
    Bash,
    Go,
    /// Executable launched directly
    Binary,
}

impl Runtime {
    /// File extension used for cached inline scripts
    pub fn extension(&self) -> &'static str {
        match self {
            Runtime::Python => "py",
            Runtime::Node => "js",
            Runtime::Bash => "sh",
            Runtime::Go => "go",
            Runtime::Binary => "bin",
        }
    }

    /// Guess the runtime from a script file extension
    pub fn from_extension(ext: &str) -> Option<Runtime> {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Some(Runtime::Python),
            "js" | "mjs" | "cjs" => Some(Runtime::Node),
            "sh" | "bash" => Some(Runtime::Bash),
            "go" => Some(Runtime::Go),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Python => "python",
            Runtime::Node => "node",
            Runtime::Bash => "bash",
            Runtime::Go => "go",
            Runtime::Binary => "binary",
        }
    }
}

impl FromStr for Runtime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Ok(Runtime::Python),
            "node" | "nodejs" | "js" => Ok(Runtime::Node),
            "bash" | "sh" => Ok(Runtime::Bash),
            "go" | "golang" => Ok(Runtime::Go),
            "binary" | "exec" => Ok(Runtime::Binary),
            other => Err(DomainError::UnknownRuntime(other.to_string())),
        }
    }
}

impl std::fmt::Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the script text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    File(PathBuf),
    /// Script body held in memory; written to the script cache before launch
    Inline { name: String, body: String },
}

/// Everything needed to run one script
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    pub runtime: Runtime,
    pub source: ScriptSource,
    pub inputs: InputEnvelope,
    /// Extra environment for the child (on top of the allowlist)
    pub env: HashMap<String, String>,
    pub working_dir: PathBuf,
    pub timeout_ms: Option<i64>,
}

impl ScriptRequest {
    pub fn new(runtime: Runtime, source: ScriptSource) -> Self {
        Self {
            runtime,
            source,
            inputs: InputEnvelope::default(),
            env: HashMap::new(),
            working_dir: PathBuf::from("."),
            timeout_ms: None,
        }
    }

    pub fn inline(runtime: Runtime, name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(
            runtime,
            ScriptSource::Inline {
                name: name.into(),
                body: body.into(),
            },
        )
    }

    pub fn file(runtime: Runtime, path: impl Into<PathBuf>) -> Self {
        Self::new(runtime, ScriptSource::File(path.into()))
    }

    pub fn with_inputs(mut self, inputs: InputEnvelope) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Short label for logs
    pub fn label(&self) -> String {
        match &self.source {
            ScriptSource::File(path) => path.display().to_string(),
            ScriptSource::Inline { name, .. } => format!("inline:{}", name),
        }
    }
}
