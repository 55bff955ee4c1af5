// turngate-core/src/runtime/mod.rs
// ============================================================================
// Module: Turngate Runtime
// Description: The turn controller and the services it composes: capability
//              gating, scope and pack bookkeeping, evidence and enforcement
//              checks, plan validation, collision guarding, proof-chain
//              traversal, memory promotion, and strategy selection.
// Purpose: Host every stateful and stateless service the dispatcher calls
//          into, kept as small, independently testable modules.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime is organized around one entry point, [`dispatcher::handle`],
//! and a set of pure or narrowly-stateful services it composes. No service
//! module depends on the dispatcher; the dependency graph only runs one way.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod capability;
pub mod collision;
pub mod dispatcher;
pub mod enforcement;
pub mod evidence_policy;
pub mod memory_service;
pub mod pack_service;
pub mod proof_chain;
pub mod scope;
pub mod strategy;
pub mod validator;
pub mod verbs;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capability::allowed_verbs;
pub use capability::verb_allowed;
pub use collision::CollisionGuard;
pub use collision::IntendedEffectSet;
pub use collision::Reservation;
pub use dispatcher::Dependencies;
pub use dispatcher::SessionLayout;
pub use dispatcher::VerbCall;
pub use dispatcher::handle;
pub use dispatcher::new_session;
pub use enforcement::GraphPolicyNode;
pub use enforcement::active_strategy_overrides;
pub use enforcement::anchors_without_active_memory;
pub use enforcement::build_enforcement_bundle;
pub use evidence_policy::distinct_source_count;
pub use evidence_policy::evaluate_change_evidence;
pub use memory_service::MemoryGraphSeedNode;
pub use memory_service::create_from_friction;
pub use memory_service::create_from_human_override;
pub use memory_service::export_as_graph_seed;
pub use memory_service::find_active_for_anchors;
pub use memory_service::load_all;
pub use memory_service::run_auto_promotion;
pub use memory_service::transition;
pub use pack_service::compute_insufficiency;
pub use pack_service::enrich;
pub use pack_service::new_pack;
pub use pack_service::register_artifact;
pub use proof_chain::ChainLink;
pub use proof_chain::LinkSource;
pub use proof_chain::ProofChain;
pub use proof_chain::build_ag_grid_chain;
pub use proof_chain::build_federation_chain;
pub use scope::check_change_scope;
pub use scope::file_in_scope;
pub use scope::resolve_within_root;
pub use scope::symbols_in_scope;
pub use strategy::StrategyInputs;
pub use strategy::StrategySelection;
pub use strategy::select_strategy;
pub use validator::MIGRATION_STRATEGY_ID;
pub use validator::SUPPORTED_CODEMODS;
pub use validator::validate;
pub use verbs::VerbOutcome;
