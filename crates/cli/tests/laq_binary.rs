//! End-to-end tests for the `laq` binary

use serde_json::{json, Value};
use std::process::{Command, Output};
use tempfile::TempDir;

const LAQ: &str = env!("CARGO_BIN_EXE_laq");

fn laq(cache: &TempDir) -> Command {
    let mut cmd = Command::new(LAQ);
    for var in [
        "LACQUER_TIMEOUT_MS",
        "LACQUER_LOG_FORMAT",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("LACQUER_SCRIPT_CACHE_DIR", cache.path());
    cmd
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "laq failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    serde_json::from_str(stdout.trim_end()).unwrap()
}

#[test]
fn test_compute_sum_prints_envelope_line() {
    let cache = TempDir::new().unwrap();
    let output = laq(&cache)
        .args(["compute", "--operation", "sum", "--data", "1,2,3,4"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "{\"outputs\":{\"value\":10,\"operation\":\"sum\",\"input_count\":4,\"input_data\":[1,2,3,4]}}\n"
    );
}

#[test]
fn test_compute_with_inputs_json() {
    let cache = TempDir::new().unwrap();
    let output = laq(&cache)
        .args(["compute", "--inputs", r#"{"data": [5, 11, 30], "operation": "filter"}"#])
        .output()
        .unwrap();

    assert_eq!(stdout_json(&output)["outputs"]["filtered_data"], json!([11, 30]));
}

#[test]
fn test_compute_inputs_conflicts_with_operation() {
    let cache = TempDir::new().unwrap();
    let output = laq(&cache)
        .args(["compute", "--operation", "median", "--inputs", "{}"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_compute_logs_stay_on_stderr() {
    let cache = TempDir::new().unwrap();
    let output = laq(&cache)
        .env("RUST_LOG", "lacquer=debug")
        .args(["compute", "--operation", "max", "--data", "3,9"])
        .output()
        .unwrap();

    assert_eq!(stdout_json(&output)["outputs"]["value"], json!(9));
    assert_eq!(String::from_utf8(output.stdout).unwrap().lines().count(), 1);
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_compute_quiet_by_default() {
    let cache = TempDir::new().unwrap();
    let output = laq(&cache)
        .args(["compute", "--data", "1"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(output.stderr.is_empty());
}

#[test]
fn test_compute_rejects_non_numeric_data() {
    let cache = TempDir::new().unwrap();
    let output = laq(&cache)
        .args(["compute", "--data", "1,abc"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("abc"));
}

#[test]
fn test_operations_lists_supported_names() {
    let cache = TempDir::new().unwrap();
    let output = laq(&cache).arg("operations").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for name in ["analyze", "transform", "filter", "sum", "average", "max", "min"] {
        assert!(stdout.contains(name), "missing {}", name);
    }
}

#[cfg(unix)]
#[test]
fn test_run_inline_bash_json() {
    let cache = TempDir::new().unwrap();
    let script = r#"echo "{\"outputs\": {\"greeting\": \"hi $GREETING_NAME\"}}""#;
    let output = laq(&cache)
        .args(["run", "--code", script, "--runtime", "bash", "--json"])
        .args(["-e", "GREETING_NAME=lacquer"])
        .output()
        .unwrap();

    assert_eq!(
        stdout_json(&output),
        json!({"outputs": {"greeting": "hi lacquer"}})
    );
}

#[cfg(unix)]
#[test]
fn test_run_script_file_receives_inputs() {
    let cache = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("echo_inputs.sh");
    std::fs::write(
        &path,
        "#!/bin/bash\necho \"{\\\"outputs\\\": $LACQUER_INPUTS}\"\n",
    )
    .unwrap();

    let output = laq(&cache)
        .arg("run")
        .arg(&path)
        .args(["--inputs", r#"{"n": 3}"#, "--json"])
        .output()
        .unwrap();

    assert_eq!(stdout_json(&output), json!({"outputs": {"n": 3}}));
}

#[cfg(unix)]
#[test]
fn test_run_failing_script_exits_non_zero() {
    let cache = TempDir::new().unwrap();
    let output = laq(&cache)
        .args([
            "run",
            "--code",
            r#"echo '{"message": "bad input"}' >&2; exit 3"#,
            "--runtime",
            "bash",
        ])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad input"));
}
