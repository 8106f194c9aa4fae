//! Smoke tests for the pageforge binary
//!
//! None of these reach a generation service.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A directory that config discovery will not walk out of.
fn isolated_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    dir
}

fn pageforge(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pageforge"));
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn classify_prints_category_and_guidance() {
    let dir = isolated_dir();
    pageforge(&dir)
        .args(["classify", "an admin dashboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category: dashboard"))
        .stdout(predicate::str::contains("Guidance:"));
}

#[test]
fn classify_ignores_a_broken_config_file() {
    let dir = isolated_dir();
    fs::create_dir(dir.path().join(".pageforge")).unwrap();
    fs::write(dir.path().join(".pageforge/config.toml"), "[llm\nmodel = ").unwrap();

    pageforge(&dir)
        .args(["classify", "online store for socks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category: commerce"));
}

#[test]
fn blank_goal_is_a_usage_error() {
    let dir = isolated_dir();
    pageforge(&dir)
        .args(["classify", "   "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("goal"));
}

#[test]
fn missing_explicit_config_is_a_usage_error() {
    let dir = isolated_dir();
    pageforge(&dir)
        .args(["--config", "missing.toml", "config"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn unknown_provider_fails_before_any_call() {
    let dir = isolated_dir();
    pageforge(&dir)
        .args(["--provider", "carrier-pigeon", "generate", "a blog"])
        .assert()
        .code(2);
    assert!(!dir.path().join("generated_page.html").exists());
}

#[test]
fn config_json_reports_value_sources() {
    let dir = isolated_dir();
    fs::create_dir(dir.path().join(".pageforge")).unwrap();
    fs::write(
        dir.path().join(".pageforge/config.toml"),
        "[llm]\nmodel = \"llama3\"\n\n[repair]\nmax_rounds = 2\n",
    )
    .unwrap();

    let output = pageforge(&dir)
        .args(["--max-attempts", "2", "config", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["llm_model"]["value"], "llama3");
    assert!(
        json["llm_model"]["source"]
            .as_str()
            .unwrap()
            .starts_with("config (")
    );
    assert_eq!(json["repair_max_rounds"]["value"], "2");
    assert_eq!(json["max_attempts"]["value"], "2");
    assert_eq!(json["max_attempts"]["source"], "cli");
    assert_eq!(json["output_path"]["source"], "default");
}

#[test]
fn help_lists_subcommands() {
    let dir = isolated_dir();
    pageforge(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("classify"));
}
