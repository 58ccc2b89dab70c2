//! CLI interface tests for the `cqc` binary: help/version output, the
//! two-positional-argument surface, and exit-code mapping (spec.md §6
//! "CLI surface", §12).

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("e2e").join("fixtures")
}

fn cqc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cqc"))
}

#[test]
fn help_mentions_usage() {
    let mut cmd = Command::new(cqc_bin());
    cmd.arg("--help");
    cmd.assert().success().stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_is_printed() {
    let mut cmd = Command::new(cqc_bin());
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("cqc"));
}

#[test]
fn compiles_input_to_the_given_output_path() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("hello.qbe");
    let input = fixtures_dir().join("hello_world.c");

    Command::new(cqc_bin()).arg(&input).arg(&output).assert().success();

    assert!(output.exists());
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("export function"));
}

#[test]
fn verbose_flag_enables_phase_logging() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("hello.qbe");
    let input = fixtures_dir().join("hello_world.c");

    Command::new(cqc_bin())
        .arg(&input)
        .arg(&output)
        .arg("--verbose")
        .assert()
        .success()
        .stderr(predicate::str::contains("lexing complete").or(predicate::str::contains("compile")));
}

#[test]
fn invalid_syntax_fails_and_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("invalid.qbe");
    let input = fixtures_dir().join("invalid_syntax.c");

    Command::new(cqc_bin())
        .arg(&input)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));

    assert!(!output.exists());
}

#[test]
fn missing_input_file_is_a_clean_failure() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out.qbe");

    Command::new(cqc_bin())
        .arg("/nonexistent/path/to/missing.c")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
