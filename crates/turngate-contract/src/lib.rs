// turngate-contract/src/lib.rs
// ============================================================================
// Module: Turngate Contract Library
// Description: The stable wire contract: verbs, schemas, rejection codes.
// Purpose: Provide canonical, generated artifacts clients can build against
//          without reading the controller's source.
// Dependencies: turngate-core, turngate-config, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Everything an external client needs to call the turn controller is
//! generated from this crate: the verb catalog with input schemas, the plan
//! graph and response envelope schemas, the rejection-code catalog with
//! remediations, and an example configuration. The `turngate-contract`
//! binary renders it all into a docs directory with a hashed manifest so
//! drift between code and published contract is detectable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod contract;
pub mod examples;
pub mod schemas;
pub mod tooling;
pub mod types;

// ============================================================================
// SECTION: Errors
// ============================================================================

use thiserror::Error;

/// Errors raised while generating or writing contract artifacts.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Artifact serialization failed.
    #[error("contract serialization error: {0}")]
    Serialization(String),
    /// A generated schema did not compile as a valid JSON Schema.
    #[error("generated schema is invalid: {0}")]
    InvalidSchema(String),
    /// An artifact path escaped the output directory.
    #[error("unsafe artifact path: {0}")]
    UnsafePath(String),
    /// Filesystem write failed.
    #[error("contract io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use contract::ContractBuilder;
pub use types::ContractArtifact;
pub use types::ContractBundle;
pub use types::ContractManifest;
pub use types::ManifestArtifact;
pub use types::RejectionCatalogEntry;
pub use types::VerbContract;
pub use types::VerbDefinition;
