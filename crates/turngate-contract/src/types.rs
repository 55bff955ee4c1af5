// turngate-contract/src/types.rs
// ============================================================================
// Module: Contract Types
// Description: Shared data models for turngate contract artifacts.
// Purpose: Provide canonical shapes for the verb catalog, schemas, and the
//          generated bundle manifest.
// Dependencies: turngate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! These structures are the canonical source for the generated artifacts:
//! docs, client SDKs, and validation tooling all consume them. Shapes only
//! ever gain fields; nothing here is renamed or removed once published.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use turngate_core::hashing::HashAlgorithm;
use turngate_core::hashing::HashDigest;
/// Canonical verb names for the turn controller.
pub use turngate_core::VerbName;

// ============================================================================
// SECTION: Manifest Types
// ============================================================================

/// Manifest describing the generated contract artifacts.
///
/// # Invariants
/// - When produced by [`crate::ContractBuilder`], `contract_version` matches
///   the crate version that generated the artifacts.
/// - When produced by [`crate::ContractBuilder`], `artifacts` are ordered by
///   their `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractManifest {
    /// Contract version identifier (matches the crate version).
    pub contract_version: String,
    /// Hash algorithm used for artifact digests.
    pub hash_algorithm: HashAlgorithm,
    /// Artifacts included in the bundle, ordered by path.
    pub artifacts: Vec<ManifestArtifact>,
}

/// Manifest entry describing a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestArtifact {
    /// Relative artifact path under the output directory.
    pub path: String,
    /// Artifact content type.
    pub content_type: String,
    /// Content digest for the artifact payload.
    pub digest: HashDigest,
}

// ============================================================================
// SECTION: Bundle Types
// ============================================================================

/// Generated contract bundle with artifacts and manifest metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBundle {
    /// Manifest describing the artifacts.
    pub manifest: ContractManifest,
    /// Artifact payloads included in the bundle.
    pub artifacts: Vec<ContractArtifact>,
}

/// Artifact payload with content bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    /// Relative artifact path under the output directory.
    pub path: String,
    /// MIME content type for the artifact.
    pub content_type: String,
    /// Serialized artifact payload bytes.
    pub bytes: Vec<u8>,
}

// ============================================================================
// SECTION: Verb Contracts
// ============================================================================

/// Verb definition published in the verb catalog.
///
/// # Invariants
/// - `name` is a stable verb identifier.
/// - `input_schema` is a JSON Schema payload for the verb's arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbDefinition {
    /// Verb wire name.
    pub name: VerbName,
    /// What the verb does.
    pub description: String,
    /// When an agent should reach for this verb.
    pub when_to_use: String,
    /// JSON Schema for the verb's arguments.
    pub input_schema: Value,
}

/// Full per-verb contract: definition plus the rejection codes the verb can
/// surface, so clients can branch on refusals without guessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbContract {
    /// The verb definition.
    pub definition: VerbDefinition,
    /// Rejection codes this verb is documented to return.
    pub rejection_codes: Vec<String>,
}

/// One row of the rejection-code catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCatalogEntry {
    /// Stable wire form of the code.
    pub code: String,
    /// The remediation sentence the controller pairs with this code.
    pub remediation: String,
}
