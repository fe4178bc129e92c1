// Input source implementations: environment variable and stdin
use std::ffi::OsString;
use std::io::{IsTerminal, Read};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;

use lacquer_core::domain::Framing;
use lacquer_core::port::InputSource;

/// Which channel a worker reads its inputs from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Environment variable when set, otherwise stdin
    Auto,
    Env,
    Stdin,
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(InputMode::Auto),
            "env" => Ok(InputMode::Env),
            "stdin" => Ok(InputMode::Stdin),
            other => Err(format!(
                "invalid input mode '{}' (expected auto, env or stdin)",
                other
            )),
        }
    }
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputMode::Auto => write!(f, "auto"),
            InputMode::Env => write!(f, "env"),
            InputMode::Stdin => write!(f, "stdin"),
        }
    }
}

/// Looks up an environment variable by name
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<OsString> + Send + Sync>;

/// Lookup backed by the process environment
pub fn process_env() -> EnvLookup {
    Arc::new(|name: &str| std::env::var_os(name))
}

/// Pick the input source for `mode` from the process environment
pub fn select_input_source(mode: InputMode, env_var: &str) -> Box<dyn InputSource> {
    select_input_source_with(mode, env_var, process_env())
}

/// Pick the input source for `mode`, reading variables through `lookup`
///
/// In `Auto` mode the choice is made once, here: the variable wins when it
/// is set (even if empty).
pub fn select_input_source_with(
    mode: InputMode,
    env_var: &str,
    lookup: EnvLookup,
) -> Box<dyn InputSource> {
    let source: Box<dyn InputSource> = match mode {
        InputMode::Env => Box::new(EnvInputSource::with_lookup(env_var, lookup)),
        InputMode::Stdin => Box::new(StdinInputSource),
        InputMode::Auto if lookup(env_var).is_some() => {
            Box::new(EnvInputSource::with_lookup(env_var, lookup))
        }
        InputMode::Auto => Box::new(StdinInputSource),
    };
    debug!(mode = %mode, source = %source.describe(), "Input source selected");
    source
}

/// Reads the plain mapping from a named environment variable
pub struct EnvInputSource {
    var: String,
    lookup: EnvLookup,
}

impl EnvInputSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self::with_lookup(var, process_env())
    }

    pub fn with_lookup(var: impl Into<String>, lookup: EnvLookup) -> Self {
        Self {
            var: var.into(),
            lookup,
        }
    }
}

impl InputSource for EnvInputSource {
    fn read_raw(&self) -> std::io::Result<Option<String>> {
        match (self.lookup)(&self.var) {
            None => Ok(None),
            Some(value) => value.into_string().map(Some).map_err(|raw| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("{} is not valid unicode: {:?}", self.var, raw),
                )
            }),
        }
    }

    fn framing(&self) -> Framing {
        Framing::Plain
    }

    fn describe(&self) -> String {
        format!("env:{}", self.var)
    }
}

/// Reads `{"inputs": {...}}` from the process stdin
///
/// An interactive terminal counts as absent input so the worker never
/// blocks waiting for a human.
pub struct StdinInputSource;

impl InputSource for StdinInputSource {
    fn read_raw(&self) -> std::io::Result<Option<String>> {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Ok(None);
        }
        let mut raw = String::new();
        stdin.lock().read_to_string(&mut raw)?;
        Ok(Some(raw))
    }

    fn framing(&self) -> Framing {
        Framing::Wrapped
    }

    fn describe(&self) -> String {
        "stdin".to_string()
    }
}

/// Reads `{"inputs": {...}}` from any reader (pipes, files, buffers)
pub struct ReaderInputSource {
    reader: Mutex<Box<dyn Read + Send>>,
    label: String,
}

impl ReaderInputSource {
    pub fn new(reader: impl Read + Send + 'static, label: impl Into<String>) -> Self {
        Self {
            reader: Mutex::new(Box::new(reader)),
            label: label.into(),
        }
    }
}

impl InputSource for ReaderInputSource {
    fn read_raw(&self) -> std::io::Result<Option<String>> {
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| std::io::Error::other("input reader lock poisoned"))?;
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Ok(Some(raw))
    }

    fn framing(&self) -> Framing {
        Framing::Wrapped
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacquer_core::application::acquire_inputs;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Cursor;

    #[test]
    fn test_input_mode_from_str() {
        assert_eq!("AUTO".parse::<InputMode>().unwrap(), InputMode::Auto);
        assert_eq!("stdin".parse::<InputMode>().unwrap(), InputMode::Stdin);
        assert!("socket".parse::<InputMode>().is_err());
    }

    fn fake_env(pairs: &[(&str, &str)]) -> EnvLookup {
        let vars: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        Arc::new(move |name: &str| vars.get(name).cloned())
    }

    #[test]
    fn test_env_source_reads_variable() {
        let lookup = fake_env(&[("STEP_INPUTS", r#"{"data": [1, 2], "operation": "max"}"#)]);

        let inputs = acquire_inputs(&EnvInputSource::with_lookup("STEP_INPUTS", lookup));
        assert_eq!(inputs.get("operation"), Some(&json!("max")));
    }

    #[test]
    fn test_env_source_absent_variable() {
        let source = EnvInputSource::with_lookup("STEP_INPUTS", fake_env(&[]));
        assert!(source.read_raw().unwrap().is_none());
        assert!(acquire_inputs(&source).is_empty());
    }

    #[test]
    fn test_env_source_process_environment() {
        let source = EnvInputSource::new("LACQUER_TEST_ENV_SOURCE_NEVER_SET");
        assert!(source.read_raw().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_env_source_non_unicode_collapses_to_empty() {
        use std::os::unix::ffi::OsStringExt;

        let lookup: EnvLookup =
            Arc::new(|_: &str| Some(OsString::from_vec(vec![b'{', 0xff, b'}'])));
        let source = EnvInputSource::with_lookup("STEP_INPUTS", lookup);

        assert_eq!(
            source.read_raw().unwrap_err().kind(),
            std::io::ErrorKind::InvalidData
        );
        assert!(acquire_inputs(&source).is_empty());
    }

    #[test]
    fn test_auto_mode_prefers_env() {
        let set = fake_env(&[("STEP_INPUTS", "{}")]);
        let source = select_input_source_with(InputMode::Auto, "STEP_INPUTS", set);
        assert_eq!(source.describe(), "env:STEP_INPUTS");

        let source = select_input_source_with(InputMode::Auto, "STEP_INPUTS", fake_env(&[]));
        assert_eq!(source.describe(), "stdin");
    }

    #[test]
    fn test_forced_modes_ignore_presence() {
        let set = fake_env(&[("STEP_INPUTS", "{}")]);
        assert_eq!(
            select_input_source_with(InputMode::Stdin, "STEP_INPUTS", set).describe(),
            "stdin"
        );
        assert_eq!(
            select_input_source_with(InputMode::Env, "STEP_INPUTS", fake_env(&[])).describe(),
            "env:STEP_INPUTS"
        );
    }

    #[test]
    fn test_reader_source() {
        let source = ReaderInputSource::new(
            Cursor::new(r#"{"inputs": {"test_param": "piped"}}"#),
            "pipe",
        );
        let inputs = acquire_inputs(&source);
        assert_eq!(inputs.test_param(), Some("piped"));
    }

    #[test]
    fn test_reader_source_empty_is_default() {
        let source = ReaderInputSource::new(Cursor::new(""), "pipe");
        assert!(acquire_inputs(&source).is_empty());
    }
}
