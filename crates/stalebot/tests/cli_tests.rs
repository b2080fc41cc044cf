//! Tests for the stalebot binary: configuration commands, exit codes and
//! failure reporting. Nothing here needs a reachable tracker.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const TOKEN_ENV: &str = "STALEBOT_CLI_TEST_TOKEN";

fn config(url: &str) -> String {
    format!(
        r#"
[tracker]
url = "{url}"
project = "FLINK"
token_env = "{TOKEN_ENV}"
timeout_secs = 2

[[rules]]
name = "stale-minor"
kind = "close"
priority = "Minor"
stale_days = 180
warning_days = 7
warning_label = "stale-minor"
done_label = "auto-closed"
warning_comment = "Idle for {{stale_days}} days."
done_comment = "Closed after {{warning_days}} more days."

[[rules]]
name = "stale-assigned"
kind = "unassign"
assigned = true
stale_days = 14
warning_days = 7
warning_label = "stale-assigned"
done_label = "auto-unassigned"
warning_comment = "Assigned but idle."
done_comment = "Unassigned."
"#
    )
}

/// Temp dir holding `stalebot.toml`, and a command running inside it
fn setup_test_env(content: &str) -> (TempDir, Command) {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("stalebot.toml"), content).unwrap();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stalebot"));
    cmd.current_dir(temp_dir.path()).env_remove(TOKEN_ENV);
    (temp_dir, cmd)
}

#[test]
fn test_check_config_ok() {
    let (_temp_dir, mut cmd) = setup_test_env(&config("https://issues.example.org/jira"));
    cmd.arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rule(s) OK"));
}

#[test]
fn test_check_config_explicit_path() {
    let (temp_dir, mut cmd) = setup_test_env("");
    let path = temp_dir.path().join("other.toml");
    fs::write(&path, config("https://issues.example.org/jira")).unwrap();

    cmd.args(["check-config", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_invalid_config_exits_with_2_and_remedy() {
    let broken = config("https://issues.example.org/jira")
        .replace("Idle for {stale_days} days.", "Idle, now {done_label}.");
    let (_temp_dir, mut cmd) = setup_test_env(&broken);

    cmd.arg("check-config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not available in a warning comment"))
        .stderr(predicate::str::contains("To fix:"));
}

#[test]
fn test_malformed_toml_exits_with_2() {
    let (_temp_dir, mut cmd) = setup_test_env("[tracker\n");
    cmd.arg("check-config").assert().code(2);
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    Command::new(assert_cmd::cargo::cargo_bin!("stalebot"))
        .current_dir(temp_dir.path())
        .arg("check-config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stalebot.toml"));
}

#[test]
fn test_list_rules_shows_queries() {
    let (_temp_dir, mut cmd) = setup_test_env(&config("https://issues.example.org/jira"));
    cmd.arg("list-rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("stale-minor"))
        .stdout(predicate::str::contains("assignee is not EMPTY"));
}

#[test]
fn test_list_rules_json() {
    let (_temp_dir, mut cmd) = setup_test_env(&config("https://issues.example.org/jira"));
    let output = cmd.args(["list-rules", "--json"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["metadata"]["command"], "list-rules");
    let rules = json["data"].as_array().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0]["name"], "stale-minor");
    assert_eq!(rules[0]["kind"], "close");
    assert_eq!(rules[1]["kind"], "unassign");
}

#[test]
fn test_live_run_without_token_exits_with_2() {
    let (_temp_dir, mut cmd) = setup_test_env(&config("https://issues.example.org/jira"));
    cmd.arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(format!("export {}=", TOKEN_ENV)));
}

#[test]
fn test_unknown_rule_exits_with_2() {
    let (_temp_dir, mut cmd) = setup_test_env(&config("https://issues.example.org/jira"));
    cmd.args(["run", "--dry-run", "--rule", "stale-blocker"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown rule 'stale-blocker'"));
}

#[test]
fn test_unreachable_tracker_exits_with_10() {
    // Nothing listens on the discard port locally
    let (_temp_dir, mut cmd) = setup_test_env(&config("http://127.0.0.1:9"));
    cmd.args(["run", "--dry-run", "--rule", "stale-minor"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("Stale ticket run aborted"));
}

#[test]
fn test_quiet_flag_is_global() {
    let (_temp_dir, mut cmd) = setup_test_env(&config("https://issues.example.org/jira"));
    cmd.args(["check-config", "-q"]).assert().success();
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    Command::new(assert_cmd::cargo::cargo_bin!("stalebot"))
        .assert()
        .code(2);
}
