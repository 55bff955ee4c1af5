// turngate-config/src/lib.rs
// ============================================================================
// Module: Turngate Configuration Library
// Description: Canonical configuration model for turngate.toml.
// Purpose: Single source of truth for turngate.toml semantics.
// Dependencies: turngate-core, turngate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `turngate-config` defines the canonical configuration model for a turn
//! controller deployment: token budgets per verb, evidence thresholds, the
//! domain-anchor walk, memory promotion windows, persisted-path layout, and
//! the built-in provider settings. Loading fails closed: an oversized,
//! non-UTF-8, malformed, or out-of-range file is an error, never a default.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AnchorConfig;
pub use config::BudgetConfig;
pub use config::ConfigError;
pub use config::ConnectorConfig;
pub use config::EvidenceConfig;
pub use config::IndexerConfig;
pub use config::MemoryConfig;
pub use config::PathsConfig;
pub use config::SandboxConfig;
pub use config::SessionStoreConfig;
pub use config::TurngateConfig;
pub use examples::example_config_toml;
