// turngate-contract/src/contract.rs
// ============================================================================
// Module: Contract Builder
// Description: Generator for turngate contract artifacts.
// Purpose: Assemble deterministic contract outputs and write them to disk.
// Dependencies: turngate-config, turngate-core, serde_json, std
// ============================================================================

//! ## Overview
//! The contract builder assembles the canonical turngate contract bundle:
//! the verb catalog, the plan graph and envelope schemas, the rejection
//! catalog, the example plan, and the example configuration. Output ordering
//! is deterministic (artifacts sorted by path, JSON keys sorted) and every
//! artifact is hashed into the manifest so published-contract drift is
//! detectable with a single digest comparison.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;
use turngate_core::hashing::DEFAULT_HASH_ALGORITHM;
use turngate_core::hashing::HashAlgorithm;
use turngate_core::hashing::hash_bytes;

use crate::ContractError;
use crate::examples;
use crate::schemas;
use crate::tooling;
use crate::types::ContractArtifact;
use crate::types::ContractBundle;
use crate::types::ContractManifest;
use crate::types::ManifestArtifact;

// ============================================================================
// SECTION: Contract Builder
// ============================================================================

/// Builder for turngate contract artifacts.
///
/// # Invariants
/// - `output_dir` is treated as a trusted root; artifact paths are validated
///   as safe, relative paths before any write occurs.
/// - Artifacts produced by [`ContractBuilder::build`] are deterministic and
///   ordered by their relative path.
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    /// Output directory for generated artifacts.
    output_dir: PathBuf,
    /// Contract version identifier.
    contract_version: String,
    /// Hash algorithm used for artifact digests.
    hash_algorithm: HashAlgorithm,
}

impl ContractBuilder {
    /// Creates a new contract builder targeting the provided output directory.
    #[must_use]
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            contract_version: env!("CARGO_PKG_VERSION").to_owned(),
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        }
    }

    /// Returns the default output directory for generated artifacts.
    #[must_use]
    pub fn default_output_dir() -> PathBuf {
        PathBuf::from("docs/generated/turngate")
    }

    /// Builds the contract bundle without writing to disk.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when serialization fails or a generated
    /// schema does not compile.
    pub fn build(&self) -> Result<ContractBundle, ContractError> {
        let plan_schema = schemas::plan_graph_schema();
        let envelope_schema = schemas::response_envelope_schema();
        schemas::compile_check(&plan_schema)?;
        schemas::compile_check(&envelope_schema)?;
        for contract in tooling::verb_contracts() {
            schemas::compile_check(&contract.definition.input_schema)?;
        }

        let mut artifacts = vec![
            json_artifact("tools/verb-contracts.json", &serde_json::to_value(tooling::verb_contracts()).map_err(serialization)?)?,
            json_artifact("schemas/plan-graph.schema.json", &plan_schema)?,
            json_artifact("schemas/response-envelope.schema.json", &envelope_schema)?,
            json_artifact("rejections/rejection-codes.json", &serde_json::to_value(tooling::rejection_catalog()).map_err(serialization)?)?,
            json_artifact("examples/plan-graph.minimal.json", &examples::minimal_plan_example())?,
            ContractArtifact {
                path: "config/turngate.example.toml".to_owned(),
                content_type: "application/toml".to_owned(),
                bytes: turngate_config::example_config_toml().as_bytes().to_vec(),
            },
        ];
        artifacts.sort_by(|a, b| a.path.cmp(&b.path));

        let manifest = ContractManifest {
            contract_version: self.contract_version.clone(),
            hash_algorithm: self.hash_algorithm,
            artifacts: artifacts
                .iter()
                .map(|artifact| ManifestArtifact {
                    path: artifact.path.clone(),
                    content_type: artifact.content_type.clone(),
                    digest: hash_bytes(self.hash_algorithm, &artifact.bytes),
                })
                .collect(),
        };

        Ok(ContractBundle { manifest, artifacts })
    }

    /// Builds the bundle and writes every artifact plus `manifest.json`
    /// beneath the output directory.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when generation or any filesystem write
    /// fails.
    pub fn write(&self) -> Result<ContractManifest, ContractError> {
        let bundle = self.build()?;
        for artifact in &bundle.artifacts {
            let relative = safe_relative_path(&artifact.path)?;
            let target = self.output_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|err| ContractError::Io(err.to_string()))?;
            }
            fs::write(&target, &artifact.bytes).map_err(|err| ContractError::Io(err.to_string()))?;
        }
        let manifest_bytes = pretty_bytes(&serde_json::to_value(&bundle.manifest).map_err(serialization)?);
        fs::create_dir_all(&self.output_dir).map_err(|err| ContractError::Io(err.to_string()))?;
        fs::write(self.output_dir.join("manifest.json"), manifest_bytes)
            .map_err(|err| ContractError::Io(err.to_string()))?;
        Ok(bundle.manifest)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Wraps a serde error into the contract error type.
fn serialization(err: serde_json::Error) -> ContractError {
    ContractError::Serialization(err.to_string())
}

/// Renders a JSON value as deterministic pretty bytes: `serde_json`'s map is
/// key-sorted, so pretty output is stable across runs.
fn pretty_bytes(value: &Value) -> Vec<u8> {
    let mut bytes = serde_json::to_vec_pretty(value).unwrap_or_default();
    bytes.push(b'\n');
    bytes
}

/// Builds a JSON artifact at `path`.
fn json_artifact(path: &str, value: &Value) -> Result<ContractArtifact, ContractError> {
    Ok(ContractArtifact {
        path: path.to_owned(),
        content_type: "application/json".to_owned(),
        bytes: pretty_bytes(value),
    })
}

/// Validates an artifact path as safe and relative.
///
/// # Errors
///
/// Returns [`ContractError::UnsafePath`] for absolute paths or any path with
/// parent components.
pub(crate) fn safe_relative_path(path: &str) -> Result<&Path, ContractError> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Err(ContractError::UnsafePath(path.to_owned()));
    }
    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(ContractError::UnsafePath(path.to_owned())),
        }
    }
    Ok(candidate)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
