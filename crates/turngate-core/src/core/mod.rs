// turngate-core/src/core/mod.rs
// ============================================================================
// Module: Turngate Core Types
// Description: Canonical session, plan, memory, and envelope schema.
// Purpose: Provide stable, serializable types shared by the runtime, the
//          store, and the contract crate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types define session state, plan graphs, memory records, and the
//! response envelope. These are the canonical source of truth for any
//! derived surfaces (CLI, contract schemas, SQLite storage).

pub mod envelope;
pub mod hashing;
pub mod ids;
pub mod memory;
pub mod pack;
pub mod plan;
pub mod rejection;
pub mod session;

pub use envelope::ResponseEnvelope;
pub use envelope::SuggestedAction;
pub use envelope::VerbDescription;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use ids::AgentId;
pub use ids::AnchorId;
pub use ids::CommitGateId;
pub use ids::MemoryId;
pub use ids::NodeId;
pub use ids::PackRef;
pub use ids::ReservationId;
pub use ids::RunSessionId;
pub use ids::StrategyId;
pub use ids::TraceId;
pub use ids::UnknownVerbName;
pub use ids::VerbName;
pub use ids::WorkId;
pub use memory::DomainAnchor;
pub use memory::EnforcementBundle;
pub use memory::EnforcementRule;
pub use memory::EnforcementType;
pub use memory::FewShotPayload;
pub use memory::MemoryPhase;
pub use memory::MemoryRecord;
pub use memory::MemoryState;
pub use memory::MemoryTrigger;
pub use memory::MigrationRule;
pub use memory::MigrationStatus;
pub use memory::PlanRulePayload;
pub use memory::RequiredStep;
pub use memory::StrategySignalPayload;
pub use pack::ContextPack;
pub use pack::PackInsufficiency;
pub use plan::AtomicityBoundary;
pub use plan::ChangeNode;
pub use plan::EscalateNode;
pub use plan::EvidencePolicy;
pub use plan::EvidenceRequestType;
pub use plan::PlanGraphDocument;
pub use plan::PlanNode;
pub use plan::PlanNodeKind;
pub use plan::RequestedEvidence;
pub use plan::SideEffectNode;
pub use plan::StrategyReason;
pub use plan::ValidateNode;
pub use rejection::RejectionCode;
pub use session::ArtifactRecord;
pub use session::BudgetStatus;
pub use session::PlanGraphProgress;
pub use session::RunState;
pub use session::ScopeAllowlist;
pub use session::SessionState;
