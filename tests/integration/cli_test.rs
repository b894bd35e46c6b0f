//! Integration tests for the termstage binary

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;
use termstage::theme::strip_ansi;

/// Run the binary with config, state and log paths inside `home`.
fn run_termstage_in(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_termstage"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_STATE_HOME", home.join("state"))
        .env_remove("TERMSTAGE_LOG")
        .env_remove("TERMSTAGE_SPEEDY")
        .output()
        .expect("Failed to execute termstage");

    let stdout = strip_ansi(&String::from_utf8_lossy(&output.stdout));
    let stderr = strip_ansi(&String::from_utf8_lossy(&output.stderr));
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn run_termstage(args: &[&str]) -> (String, String, i32) {
    let home = TempDir::new().expect("create temp home");
    run_termstage_in(home.path(), args)
}

// ============================================================================
// Help and Version
// ============================================================================

#[test]
fn short_help_lists_subcommands() {
    let (stdout, _stderr, exit_code) = run_termstage(&["-h"]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("Scripted live terminal demos on tmux"));
    for sub in ["run", "check", "config", "completions"] {
        assert!(stdout.contains(sub), "missing {} in help", sub);
    }
}

#[test]
fn version_starts_with_package_version() {
    AssertCommand::new(env!("CARGO_BIN_EXE_termstage"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "termstage {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn run_without_script_is_a_usage_error() {
    let (_stdout, stderr, exit_code) = run_termstage(&["run"]);

    assert_eq!(exit_code, 2);
    assert!(stderr.contains("<SCRIPT>"));
}

// ============================================================================
// Check
// ============================================================================

#[test]
fn check_lists_every_step() {
    let (stdout, stderr, exit_code) = run_termstage(&["check", "tests/fixtures/demo.toml"]);

    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    insta::assert_snapshot!(stdout, @r"
    1 chapter: Intro
    2 note: remember to breathe
    3 $ echo hi
    4 display text: a picture is worth a thousand words
    5 keys: C-l
    6 pause: take questions
    tests/fixtures/demo.toml: 6 steps, 1 commands
    ");
}

#[test]
fn check_reports_unknown_step_key() {
    let (_stdout, stderr, exit_code) = run_termstage(&["check", "tests/fixtures/invalid.toml"]);

    assert_eq!(exit_code, 1);
    assert!(stderr.contains("invalid.toml"));
    assert!(stderr.contains("comand"));
}

#[test]
fn check_rejects_script_without_steps() {
    let (_stdout, stderr, exit_code) = run_termstage(&["check", "tests/fixtures/empty.toml"]);

    assert_eq!(exit_code, 1);
    assert!(stderr.contains("no steps"));
}

#[test]
fn check_reports_each_missing_file() {
    let (_stdout, stderr, exit_code) =
        run_termstage(&["check", "tests/fixtures/missing_media.toml"]);

    assert_eq!(exit_code, 1);
    assert!(stderr.contains("does-not-exist.png"));
    assert!(stderr.contains("also-missing.png"));
    assert!(stderr.contains("2 referenced file(s) not found"));
}

#[test]
fn check_nonexistent_script_exits_1() {
    let (_stdout, stderr, exit_code) = run_termstage(&["check", "no-such-talk.toml"]);

    assert_eq!(exit_code, 1);
    assert!(stderr.contains("no-such-talk.toml"));
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn dry_run_keeps_notes_off_the_audience() {
    let (stdout, stderr, exit_code) =
        run_termstage(&["run", "--dry-run", "--seed", "1", "tests/fixtures/demo.toml"]);

    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    let (audience, speaker) = stdout
        .split_once("── speaker ──")
        .expect("speaker section");
    assert!(audience.contains("── audience ──"));
    assert!(audience.contains("Intro"));
    assert!(audience.contains("echo hi\nhi\n"));
    assert!(audience.contains("a picture is worth a thousand words"));
    assert!(!audience.contains("remember to breathe"));
    assert!(!audience.contains("take questions"));

    assert!(speaker.contains("remember to breathe"));
    assert!(speaker.contains("$ echo hi"));
    assert!(speaker.contains("[waiting] take questions"));
}

#[test]
fn dry_run_writes_the_log_file() {
    let home = TempDir::new().unwrap();
    let log = home.path().join("run.log");
    let log_arg = log.display().to_string();

    let (_stdout, stderr, exit_code) = run_termstage_in(
        home.path(),
        &["run", "--dry-run", "--log-file", &log_arg, "tests/fixtures/demo.toml"],
    );

    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains("presentation started"));
    assert!(content.contains("presentation complete"));
}

#[test]
fn run_needs_a_terminal() {
    let (_stdout, stderr, exit_code) = run_termstage(&["run", "tests/fixtures/demo.toml"]);

    assert_eq!(exit_code, 1);
    assert!(stderr.contains("interactive terminal"));
}

// ============================================================================
// Config and Completions
// ============================================================================

#[test]
fn config_path_uses_config_home() {
    let home = TempDir::new().unwrap();
    let (stdout, _stderr, exit_code) = run_termstage_in(home.path(), &["config", "path"]);

    assert_eq!(exit_code, 0);
    let expected = home.path().join("config").join("termstage").join("config.toml");
    assert_eq!(stdout.trim(), expected.display().to_string());
}

#[test]
fn config_show_prints_defaults() {
    let (stdout, _stderr, exit_code) = run_termstage(&["config", "show"]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("[typing]"));
    assert!(stdout.contains("[session]"));
}

#[test]
fn bash_completions_are_generated() {
    AssertCommand::new(env!("CARGO_BIN_EXE_termstage"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_termstage"));
}
