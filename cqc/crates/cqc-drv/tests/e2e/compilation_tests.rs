//! The six end-to-end scenarios (spec.md §8) driven through the `cqc`
//! binary: successful compiles produce QBE text with the shapes those
//! scenarios call for, and the two rejection scenarios fail cleanly.

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

fn compile_fixture(name: &str) -> (bool, String, String) {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out.qbe");
    let input = fixtures_dir().join(name);

    let result = Command::new(cqc_bin()).arg(&input).arg(&output).output().unwrap();
    let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
    let ir = std::fs::read_to_string(&output).unwrap_or_default();
    (result.status.success(), ir, stderr)
}

#[test]
fn recursive_factorial_emits_two_functions() {
    let (ok, ir, _) = compile_fixture("arithmetic.c");
    assert!(ok);
    assert_eq!(ir.matches("export function").count(), 2);
    assert!(ir.contains("$fact"));
    assert!(ir.contains("$main"));
}

#[test]
fn forward_declaration_is_promoted_to_one_definition() {
    let (ok, ir, _) = compile_fixture("functions.c");
    assert!(ok);
    assert_eq!(ir.matches("function w $f(").count(), 1);
    assert!(ir.contains("call $f("));
}

#[test]
fn pointer_arithmetic_scales_by_element_size_and_loads_signed_byte() {
    let (ok, ir, _) = compile_fixture("pointer_arith.c");
    assert!(ok);
    assert!(ir.contains(", 1"));
    assert!(ir.contains("loadsb"));
}

#[test]
fn control_flow_loop_runs_to_completion() {
    let (ok, ir, _) = compile_fixture("control_flow.c");
    assert!(ok);
    assert!(ir.contains("@cond_"));
    assert!(ir.contains("@body_"));
}

#[test]
fn loops_fixture_accumulates_a_total() {
    let (ok, ir, _) = compile_fixture("loops.c");
    assert!(ok);
    assert!(ir.contains("add"));
}

#[test]
fn variables_fixture_covers_every_primitive_kind() {
    let (ok, ir, _) = compile_fixture("variables.c");
    assert!(ok);
    assert!(ir.contains("alloc4"));
}

#[test]
fn hello_world_calls_puts_with_a_data_blob() {
    let (ok, ir, _) = compile_fixture("hello_world.c");
    assert!(ok);
    assert!(ir.contains("call $puts("));
    assert!(ir.contains("data $_data_0"));
}

#[test]
fn invalid_syntax_is_rejected_with_a_parse_diagnostic() {
    let (ok, _, stderr) = compile_fixture("invalid_syntax.c");
    assert!(!ok);
    assert!(stderr.contains("error"));
}

#[test]
fn argument_count_mismatch_is_rejected_with_a_type_diagnostic() {
    let (ok, _, stderr) = compile_fixture("sema_error.c");
    assert!(!ok);
    assert!(stderr.to_lowercase().contains("argument") || stderr.contains("expect"));
}
