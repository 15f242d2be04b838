//! CLI surface tests for the compiled binary.
//!
//! Everything here runs without a daemon: help/version output, completion
//! generation, argument validation, and the offline `log` command.

use assert_cmd::Command;
use predicates::prelude::*;

fn studytimer() -> Command {
    Command::cargo_bin("studytimer").unwrap()
}

// ============================================================================
// Help and Version
// ============================================================================

#[test]
fn help_lists_all_commands() {
    studytimer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("pause"))
        .stdout(predicate::str::contains("resume"))
        .stdout(predicate::str::contains("reset"))
        .stdout(predicate::str::contains("finish"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("log"));
}

#[test]
fn no_args_prints_help() {
    studytimer()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag() {
    studytimer()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("studytimer"));
}

#[test]
fn daemon_command_is_hidden_from_help() {
    studytimer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("daemon").not());
}

// ============================================================================
// Argument Validation
// ============================================================================

#[test]
fn start_rejects_out_of_range_minutes() {
    for minutes in ["0", "61", "abc"] {
        studytimer()
            .args(["start", "--minutes", minutes])
            .assert()
            .failure();
    }
}

#[test]
fn unknown_command_fails() {
    studytimer()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized"));
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn completions_generate_for_bash() {
    studytimer()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("studytimer"));
}

#[test]
fn completions_reject_unknown_shell() {
    studytimer()
        .args(["completions", "tcsh"])
        .assert()
        .failure();
}

// ============================================================================
// Offline Commands
// ============================================================================

#[test]
fn log_with_empty_home_shows_zero_total() {
    let home = tempfile::tempdir().unwrap();

    studytimer()
        .arg("log")
        .env("HOME", home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("total: 0 min"))
        .stdout(predicate::str::contains("no finished sessions yet"));
}

#[test]
fn status_without_daemon_reports_connection_error() {
    let home = tempfile::tempdir().unwrap();

    studytimer()
        .arg("status")
        .env("HOME", home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("daemon"));
}
