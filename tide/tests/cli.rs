//! CLI tests for the `tide` binary.
//!
//! Spawns the binary in a temp directory and checks exit codes and output.
//! None of these reach a reasoner.

use std::fs;
use std::process::Command;

use serde_json::json;
use tide::core::types::Turn;
use tide::exit_codes;
use tide::io::config::{TideConfig, load_config};
use tide::io::history::HistoryStore;
use tide::test_support::call_with;

fn tide(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tide"));
    cmd.current_dir(dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("AZURE_OPENAI_ENDPOINT")
        .env_remove("OPENAI_BASE_URL");
    cmd
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = tide(temp.path()).arg("init").status().expect("tide init");
    assert_eq!(status.code(), Some(exit_codes::OK));
    let cfg = load_config(&temp.path().join(".tide/config.toml")).expect("load");
    assert_eq!(cfg, TideConfig::default());

    let again = tide(temp.path()).arg("init").status().expect("tide init");
    assert_eq!(again.code(), Some(exit_codes::INVALID));

    let forced = tide(temp.path())
        .args(["init", "--force"])
        .status()
        .expect("tide init --force");
    assert_eq!(forced.code(), Some(exit_codes::OK));
}

#[test]
fn run_without_api_key_is_a_configuration_error() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = tide(temp.path())
        .args(["run", "say", "hello"])
        .output()
        .expect("tide run");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr: {stderr}");
    assert!(!temp.path().join(".tide/history.json").exists());
}

#[test]
fn invalid_config_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join(".tide")).expect("mkdir");
    fs::write(temp.path().join(".tide/config.toml"), "max_iterations = 0\n").expect("write");

    let output = tide(temp.path()).arg("history").output().expect("tide history");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_iterations"));
}

#[test]
fn history_prints_saved_turns() {
    let temp = tempfile::tempdir().expect("tempdir");
    let invocation = call_with("call_7", "terminal", json!({"command": "ls"}));
    HistoryStore::new(temp.path().join("saved.json"))
        .save(&[
            Turn::user("list files"),
            Turn::assistant_with_invocations("", vec![invocation.clone()]),
            Turn::tool_result(&invocation, "a.txt"),
            Turn::assistant("There is one file."),
        ])
        .expect("save");

    let output = tide(temp.path())
        .args(["--history", "saved.json", "history"])
        .output()
        .expect("tide history");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("user: list files"));
    assert!(stdout.contains("  -> terminal {\"command\":\"ls\"} [call_7]"));
    assert!(stdout.contains("tool (terminal, call_7): a.txt"));
    assert!(stdout.contains("assistant: There is one file."));
}

#[test]
fn history_without_file_reports_empty() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = tide(temp.path()).arg("history").output().expect("tide history");
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(String::from_utf8_lossy(&output.stdout).contains("no history"));
}
