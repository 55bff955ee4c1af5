// turngate-cli/tests/config_commands.rs
// ============================================================================
// Module: Config Command Tests
// Description: The binary's config subcommands, spawned for real.
// Purpose: Ensure the operator-facing config surface works end to end.
// Dependencies: turngate-cli (binary), turngate-config, tempfile
// ============================================================================

//! ## Overview
//! Spawns the compiled `turngate` binary so argument parsing, config
//! resolution, and exit codes are all exercised exactly as an operator
//! would hit them.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::process::Command;

use turngate_config::TurngateConfig;

#[test]
fn config_example_prints_a_valid_configuration() {
    let output = Command::new(env!("CARGO_BIN_EXE_turngate"))
        .args(["config", "example"])
        .output()
        .expect("binary runs");
    assert!(output.status.success());
    TurngateConfig::from_bytes(&output.stdout).expect("printed example is valid");
}

#[test]
fn config_validate_accepts_a_valid_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("turngate.toml");
    fs::write(&path, "[budget]\nmax_tokens = 1000\nthreshold_tokens = 900\n").expect("writes");
    let output = Command::new(env!("CARGO_BIN_EXE_turngate"))
        .args(["--config", path.to_str().expect("utf8 path"), "config", "validate"])
        .output()
        .expect("binary runs");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn config_validate_rejects_an_invalid_file_with_a_nonzero_exit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("turngate.toml");
    fs::write(&path, "[budget]\nmax_tokens = 10\nthreshold_tokens = 20\n").expect("writes");
    let output = Command::new(env!("CARGO_BIN_EXE_turngate"))
        .args(["--config", path.to_str().expect("utf8 path"), "config", "validate"])
        .output()
        .expect("binary runs");
    assert!(!output.status.success());
}
