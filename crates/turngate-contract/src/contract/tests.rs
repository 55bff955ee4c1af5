// turngate-contract/src/contract/tests.rs
// ============================================================================
// Module: Contract Builder Unit Tests
// Description: Determinism, ordering, and path-safety checks.
// Purpose: Catch non-deterministic output before it reaches a published
//          bundle.
// Dependencies: crate::contract
// ============================================================================

use std::path::PathBuf;

use super::ContractBuilder;
use super::safe_relative_path;
use turngate_core::hashing::hash_bytes;

#[test]
fn building_twice_produces_identical_bundles() {
    let builder = ContractBuilder::new(PathBuf::from("unused"));
    let first = builder.build().expect("first build");
    let second = builder.build().expect("second build");
    assert_eq!(first.manifest, second.manifest);
    assert_eq!(first.artifacts, second.artifacts);
}

#[test]
fn manifest_artifacts_are_sorted_by_path() {
    let builder = ContractBuilder::new(PathBuf::from("unused"));
    let bundle = builder.build().expect("builds");
    let paths: Vec<&str> = bundle.manifest.artifacts.iter().map(|a| a.path.as_str()).collect();
    let mut sorted = paths.clone();
    sorted.sort_unstable();
    assert_eq!(paths, sorted);
}

#[test]
fn manifest_digests_match_the_artifact_bytes() {
    let builder = ContractBuilder::new(PathBuf::from("unused"));
    let bundle = builder.build().expect("builds");
    for (entry, artifact) in bundle.manifest.artifacts.iter().zip(bundle.artifacts.iter()) {
        assert_eq!(entry.path, artifact.path);
        let recomputed = hash_bytes(bundle.manifest.hash_algorithm, &artifact.bytes);
        assert_eq!(entry.digest, recomputed, "digest drift for {}", entry.path);
    }
}

#[test]
fn unsafe_artifact_paths_are_rejected() {
    assert!(safe_relative_path("/etc/passwd").is_err());
    assert!(safe_relative_path("../outside.json").is_err());
    assert!(safe_relative_path("tools/../../outside.json").is_err());
    assert!(safe_relative_path("tools/verb-contracts.json").is_ok());
}
