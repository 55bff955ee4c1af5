// turngate-core/src/core/memory.rs
// ============================================================================
// Module: Memory Records and Domain Anchors
// Description: The durable lessons a memory service accumulates across runs,
//              and the folder-tree anchors those lessons attach to.
// Purpose: Let friction observed in one session change the enforcement
//          applied to future sessions without code changes.
// Dependencies: serde
// ============================================================================

//! Durable lessons a memory service accumulates across runs, and the folder-tree anchors those lessons attach to.

use serde::Deserialize;
use serde::Serialize;

use crate::core::ids::AnchorId;
use crate::core::ids::MemoryId;
use crate::core::ids::StrategyId;

/// What caused a memory record to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTrigger {
    /// A repeated rejection pattern was observed across sessions.
    RejectionPattern,
    /// A human explicitly overrode a decision and left a record of why.
    HumanOverride,
    /// A retrospective review after task completion surfaced a lesson.
    Retrospective,
}

/// When a memory record's enforcement applies within a session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPhase {
    /// Applies while a plan is being built, before submission.
    Planning,
    /// Applies while an accepted plan is executing.
    Execution,
    /// Applies only during retrospective review, not live enforcement.
    Retrospective,
}

/// How a memory record's lesson is enforced once promoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementType {
    /// Surfaced to the agent as a before/after example, not hard-enforced.
    FewShot,
    /// Hard-enforced as a plan rule the validator checks.
    PlanRule,
    /// Feeds into strategy selection as a signal, not a hard rule.
    StrategySignal,
    /// Surfaced for awareness only; never blocks a plan.
    Informational,
}

/// The lifecycle state of a memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryState {
    /// Newly created, not yet eligible for enforcement.
    Pending,
    /// Enforced, but still within its promotion observation window.
    Provisional,
    /// Enforced with full confidence.
    Approved,
    /// Rejected during review; never enforced.
    Rejected,
    /// Previously approved, but aged out or superseded.
    Expired,
}

/// A before/after example used to steer an agent away from a past mistake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotPayload {
    /// What the agent did that caused friction.
    pub before: String,
    /// What it should have done instead.
    pub after: String,
    /// Why the `before` approach was wrong.
    pub why_wrong: String,
}

/// A single step a plan rule requires be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredStep {
    /// The kind of step required, e.g. `"verification_hook"`, `"citation"`.
    pub kind: String,
    /// A pattern the step's target must match, if the kind needs one.
    #[serde(default)]
    pub target_pattern: Option<String>,
}

/// A hard-enforced rule: when `condition` matches a change node, the listed
/// steps must all be present or the plan is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRulePayload {
    /// A pattern describing which change nodes this rule applies to.
    pub condition: String,
    /// Steps that must be present when the condition matches.
    pub required_steps: Vec<RequiredStep>,
}

/// A signal that nudges strategy selection without hard-blocking a plan.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StrategySignalPayload {
    /// Context-signature feature overrides this memory contributes.
    pub feature_overrides: std::collections::BTreeMap<String, String>,
}

/// A single durable lesson accumulated by the memory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Identifies this memory record.
    pub id: MemoryId,
    /// What caused this record to be created.
    pub trigger: MemoryTrigger,
    /// When this record's enforcement applies.
    pub phase: MemoryPhase,
    /// Domain anchors this record is attached to.
    pub domain_anchor_ids: Vec<AnchorId>,
    /// Rejection codes this record's friction pattern is associated with.
    #[serde(default)]
    pub rejection_codes: Vec<String>,
    /// The strategy in force when this record's triggering friction occurred.
    #[serde(default)]
    pub origin_strategy_id: Option<StrategyId>,
    /// How this record's lesson is enforced.
    pub enforcement_type: EnforcementType,
    /// Payload for `EnforcementType::FewShot`.
    #[serde(default)]
    pub few_shot: Option<FewShotPayload>,
    /// Payload for `EnforcementType::PlanRule`.
    #[serde(default)]
    pub plan_rule: Option<PlanRulePayload>,
    /// Payload for `EnforcementType::StrategySignal`.
    #[serde(default)]
    pub strategy_signal: Option<StrategySignalPayload>,
    /// Current lifecycle state.
    pub state: MemoryState,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
    /// Last update timestamp, RFC 3339.
    pub updated_at: String,
    /// Free-form note on where this record came from.
    pub provenance: String,
}

/// A node in the domain anchor tree, rooted at the worktree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAnchor {
    /// Identifies this anchor.
    pub id: AnchorId,
    /// Human-readable name for this anchor.
    pub name: String,
    /// Folder path, relative to the worktree root, this anchor covers.
    pub folder_path: String,
    /// Depth within the anchor tree; the worktree root is depth zero.
    pub depth: u32,
    /// The parent anchor, if this is not the root.
    #[serde(default)]
    pub parent_anchor_id: Option<AnchorId>,
    /// Whether this anchor was auto-seeded from folder structure rather than
    /// declared explicitly.
    pub auto_seeded: bool,
}

/// The enforcement status of a construct named by a migration rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    /// The replacement construct is approved for use.
    Approved,
    /// The replacement exists but is still under evaluation.
    Candidate,
    /// No replacement is currently known.
    NoAnalog,
    /// The migration rule's status could not be determined.
    Unknown,
}

/// Marks a deprecated construct and, if known, its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRule {
    /// The deprecated construct's tag, e.g. a symbol or component name.
    pub from_tag: String,
    /// The replacement construct's tag, if one exists.
    #[serde(default)]
    pub to_tag: Option<String>,
    /// The replacement's enforcement status.
    pub status: MigrationStatus,
}

/// A single enforced rule inside an [`EnforcementBundle`], tagged with the
/// source it was derived from so a rejection can point back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementRule {
    /// Where this rule came from, e.g. a memory id or a graph policy node id.
    pub source: String,
    /// A pattern describing which change nodes this rule applies to.
    pub condition: String,
    /// Steps that must be present when the condition matches.
    pub required_steps: Vec<RequiredStep>,
    /// The rejection code to raise when this rule is violated.
    pub deny_code: String,
}

/// The merged set of enforcement inputs the validator checks a plan against.
///
/// Built fresh for each plan submission from currently active memory records,
/// graph-derived policy rules, and migration rules, so enforcement always
/// reflects the latest accumulated knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnforcementBundle {
    /// Plan rules derived from active memory records.
    pub memory_plan_rules: Vec<EnforcementRule>,
    /// Plan rules derived from knowledge-graph policy nodes.
    pub graph_policy_rules: Vec<EnforcementRule>,
    /// Migration rules in force.
    pub migration_rules: Vec<MigrationRule>,
    /// Policies surfaced for awareness only; never checked by the validator.
    pub advisory_policies: Vec<String>,
}
