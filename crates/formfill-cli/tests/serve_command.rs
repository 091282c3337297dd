use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_formfill_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("formfill")
}

#[test]
fn test_serve_command_help() {
    let mut cmd = Command::new(get_formfill_bin());
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Run the profile and form interpretation API",
        ))
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--db"))
        .stdout(predicate::str::contains("FORMFILL_PORT"))
        .stdout(predicate::str::contains("--assist-url"))
        .stdout(predicate::str::contains("--assist-docs"))
        .stdout(predicate::str::contains("--assist-context-limit"));
}

#[test]
fn test_serve_rejects_non_numeric_context_limit() {
    let mut cmd = Command::new(get_formfill_bin());
    cmd.arg("serve").arg("--assist-context-limit").arg("many");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_serve_hides_assist_key_value() {
    let mut cmd = Command::new(get_formfill_bin());
    cmd.env("FORMFILL_ASSIST_KEY", "sk-secret-value")
        .arg("serve")
        .arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sk-secret-value").not());
}

#[test]
fn test_serve_rejects_invalid_port() {
    let mut cmd = Command::new(get_formfill_bin());
    cmd.arg("serve").arg("--port").arg("99999");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_serve_with_unusable_docs_dir_fails() {
    let temp = tempfile::tempdir().unwrap();
    let mut cmd = Command::new(get_formfill_bin());
    cmd.arg("serve")
        .arg("--db")
        .arg(temp.path().join("formfill.db"))
        .arg("--assist-url")
        .arg("http://127.0.0.1:9/v1/chat/completions")
        .arg("--assist-docs")
        .arg(temp.path().join("missing-docs"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to set up model assist"));
}

#[test]
fn test_main_help_lists_commands() {
    let mut cmd = Command::new(get_formfill_bin());
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("fill"))
        .stdout(predicate::str::contains("interpret"))
        .stdout(predicate::str::contains("completion"));
}
