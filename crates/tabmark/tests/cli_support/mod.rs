#![allow(dead_code)]

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn tabmark_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tabmark"))
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Run the CLI with an isolated TABMARK_HOME.
pub fn run_cli(home: &TempDir, args: &[&str]) -> Output {
    Command::new(tabmark_bin())
        .args(args)
        .env("TABMARK_HOME", home.path())
        .env_remove("TABMARK_CONFIG")
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to execute tabmark CLI")
}

pub fn assert_cli_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn parse_json_output(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').unwrap_or_else(|| {
        panic!(
            "no JSON payload found in output\nstdout:\n{}\nstderr:\n{}",
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    });
    let mut deserializer = serde_json::Deserializer::from_str(&stdout[json_start..]);
    serde_json::Value::deserialize(&mut deserializer).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}",
            err, stdout
        )
    })
}

pub fn run_cli_json(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = run_cli(home, args);
    assert_cli_success(&output, args);
    parse_json_output(&output)
}
