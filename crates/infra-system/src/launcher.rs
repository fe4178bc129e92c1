// Runtime launcher table: which program runs a script for each Runtime
use std::collections::HashMap;
use std::path::Path;

use lacquer_core::domain::Runtime;

/// Program plus arguments for one launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Maps each runtime to its interpreter invocation
///
/// Defaults: `python3 <script>`, `node <script>`, `bash <script>`,
/// `go run <script>`; `binary` runs the script path itself.
#[derive(Debug, Clone)]
pub struct Launcher {
    overrides: HashMap<Runtime, Vec<String>>,
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    /// Replace the interpreter invocation for `runtime`
    ///
    /// `argv` is the program followed by any leading arguments; the script
    /// path is appended after them.
    pub fn with_interpreter(mut self, runtime: Runtime, argv: Vec<String>) -> Self {
        self.overrides.insert(runtime, argv);
        self
    }

    fn interpreter(&self, runtime: Runtime) -> Vec<String> {
        if let Some(argv) = self.overrides.get(&runtime) {
            return argv.clone();
        }
        let argv: &[&str] = match runtime {
            Runtime::Python => &["python3"],
            Runtime::Node => &["node"],
            Runtime::Bash => &["bash"],
            Runtime::Go => &["go", "run"],
            Runtime::Binary => &[],
        };
        argv.iter().map(|s| s.to_string()).collect()
    }

    pub fn command_for(&self, runtime: Runtime, script: &Path) -> LaunchCommand {
        let script = script.display().to_string();
        let mut argv = self.interpreter(runtime);

        if argv.is_empty() {
            return LaunchCommand {
                program: script,
                args: Vec::new(),
            };
        }

        let program = argv.remove(0);
        argv.push(script);
        LaunchCommand {
            program,
            args: argv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_commands() {
        let launcher = Launcher::default();
        let script = Path::new("/tmp/step.py");

        assert_eq!(
            launcher.command_for(Runtime::Python, script),
            LaunchCommand {
                program: "python3".to_string(),
                args: vec!["/tmp/step.py".to_string()],
            }
        );
        assert_eq!(
            launcher.command_for(Runtime::Go, Path::new("main.go")).args,
            vec!["run".to_string(), "main.go".to_string()]
        );
    }

    #[test]
    fn test_binary_runs_script_directly() {
        let command = Launcher::default().command_for(Runtime::Binary, Path::new("./worker"));
        assert_eq!(command.program, "./worker");
        assert!(command.args.is_empty());
    }

    #[test]
    fn test_interpreter_override() {
        let launcher = Launcher::new()
            .with_interpreter(Runtime::Python, vec!["uv".to_string(), "run".to_string()]);
        let command = launcher.command_for(Runtime::Python, Path::new("a.py"));
        assert_eq!(command.program, "uv");
        assert_eq!(command.args, vec!["run".to_string(), "a.py".to_string()]);
    }
}
