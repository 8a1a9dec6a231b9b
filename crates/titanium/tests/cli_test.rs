//! Smoke tests for the command-line surface.

use assert_cmd::Command;
use predicates::prelude::*;

fn titanium() -> Command {
    Command::cargo_bin("titanium").expect("binary builds")
}

#[test]
fn help_lists_the_command_tree() {
    titanium()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("dashboard"))
        .stdout(predicate::str::contains("thermostat"));
}

#[test]
fn version_prints() {
    titanium()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("titanium"));
}

#[test]
fn no_arguments_shows_usage() {
    titanium()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    titanium().arg("defrost").assert().failure().code(2);
}

#[test]
fn config_path_prints_a_location() {
    titanium()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("titanium"));
}
