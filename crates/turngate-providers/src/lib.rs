// turngate-providers/src/lib.rs
// ============================================================================
// Module: Turngate Providers
// Description: Built-in, zero-config implementations of the Indexer,
//              GraphClient, and Connector interfaces.
// Purpose: Give a turngate session something real to run against without
//          requiring a language server, graph database, or issue tracker.
// Dependencies: turngate-core, reqwest, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! This crate ships the default collaborators `turngate-cli` wires into the
//! dispatcher: [`WalkingIndexer`] for read-verb evidence over a workspace
//! tree, [`InMemoryGraphClient`] for proof-chain and policy-node traversal,
//! and [`HttpConnector`] for issue-tracker and API-spec fetches. None of
//! these are required; the dispatcher runs with any collaborator absent and
//! degrades per-verb rather than failing the whole session.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod anchors;
pub mod connector;
pub mod graph;
pub mod indexer;
pub mod sandbox;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use anchors::AnchorWalk;
pub use anchors::seed_anchors;
pub use connector::HttpConnector;
pub use connector::HttpConnectorConfig;
pub use graph::InMemoryGraphClient;
pub use indexer::WalkingIndexer;
pub use sandbox::ProcessSandbox;
