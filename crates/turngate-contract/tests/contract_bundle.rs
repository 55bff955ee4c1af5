// turngate-contract/tests/contract_bundle.rs
// ============================================================================
// Module: Contract Bundle Tests
// Description: End-to-end bundle generation against a real directory.
// Purpose: Ensure the written bundle is complete, verifiable, and stable.
// Dependencies: turngate-contract, tempfile
// ============================================================================

//! ## Overview
//! Writes the bundle into a temp directory and checks the manifest against
//! the files actually on disk, the same check `turngate-contract verify`
//! performs in CI.

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

use turngate_contract::ContractBuilder;
use turngate_contract::ContractManifest;
use turngate_core::hashing::hash_bytes;

#[test]
fn writing_the_bundle_produces_every_manifest_artifact_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = ContractBuilder::new(dir.path().to_path_buf()).write().expect("writes");
    for artifact in &manifest.artifacts {
        let on_disk = fs::read(dir.path().join(&artifact.path)).expect("artifact exists");
        let digest = hash_bytes(manifest.hash_algorithm, &on_disk);
        assert_eq!(digest, artifact.digest, "digest mismatch for {}", artifact.path);
    }
}

#[test]
fn the_manifest_file_itself_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let written = ContractBuilder::new(dir.path().to_path_buf()).write().expect("writes");
    let bytes = fs::read(dir.path().join("manifest.json")).expect("manifest exists");
    let parsed: ContractManifest = serde_json::from_slice(&bytes).expect("manifest parses");
    assert_eq!(parsed, written);
}

#[test]
fn the_bundle_includes_the_expected_artifact_families() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = ContractBuilder::new(dir.path().to_path_buf()).write().expect("writes");
    let paths: Vec<&str> = manifest.artifacts.iter().map(|a| a.path.as_str()).collect();
    for expected in [
        "config/turngate.example.toml",
        "examples/plan-graph.minimal.json",
        "rejections/rejection-codes.json",
        "schemas/plan-graph.schema.json",
        "schemas/response-envelope.schema.json",
        "tools/verb-contracts.json",
    ] {
        assert!(paths.contains(&expected), "missing artifact {expected}");
    }
}
