//! End-to-end tests for the `ripple` binary.

use std::path::PathBuf;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn ripple(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ripple"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ripple")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_run_switch_falls_through() {
    let program = fixture("pick.json");
    let output = ripple(&["run", program.to_str().unwrap(), "--entry", "pick", "--arg", "1"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "a()\nb()\n");

    let output = ripple(&["run", program.to_str().unwrap(), "--entry", "pick", "--arg", "9"]);
    assert_eq!(stdout(&output), "c()\n");
}

#[test]
fn test_run_prints_result() {
    let program = fixture("pick.json");
    let output = ripple(&["run", program.to_str().unwrap(), "--entry", "count", "--arg", "12"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "12\n");
}

#[test]
fn test_run_rejects_wrong_arity() {
    let program = fixture("pick.json");
    let output = ripple(&["run", program.to_str().unwrap(), "--entry", "count"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("takes 1 argument(s), 0 given"));
}

#[test]
fn test_lower_prints_ir() {
    let program = fixture("pick.json");
    let output = ripple(&["lower", program.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let ir = stdout(&output);
    assert!(ir.starts_with("(import \"a\")\n"));
    assert!(ir.contains("(func $pick (export \"pick\") (param i32)"));
    assert!(ir.contains("(br_table $case0$0 $case1$0 $default$0"));
    assert!(ir.contains("(loop $continue$0"));
}

#[test]
fn test_check_clean_program() {
    let program = fixture("pick.json");
    let output = ripple(&["check", program.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).ends_with(": ok\n"));
}

#[test]
fn test_check_reports_with_source() {
    let program = fixture("broken.json");
    let source = fixture("broken.ts");
    let output = ripple(&[
        "check",
        program.to_str().unwrap(),
        "--source",
        source.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).ends_with(": 1 error(s)\n"));
    let report = stderr(&output);
    assert!(report.contains("E2002"));
    assert!(report.contains("function must return a value"));
}

#[test]
fn test_check_reports_without_source() {
    let program = fixture("broken.json");
    let output = ripple(&["check", program.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("function must return a value at 27..34"));
}

#[test]
fn test_unsupported_pointer_width() {
    let program = fixture("pick.json");
    let output = ripple(&["check", program.to_str().unwrap(), "--pointer-width", "16"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unsupported pointer width 16, expected 32 or 64"));
}

#[test]
fn test_wide_pointer_width() {
    let program = fixture("pick.json");
    let output = ripple(&["check", program.to_str().unwrap(), "--pointer-width", "64"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}
