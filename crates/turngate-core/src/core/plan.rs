// turngate-core/src/core/plan.rs
// ============================================================================
// Module: Plan Graph
// Description: The submitted unit of intended work, as a dependency graph of
//              typed nodes.
// Purpose: Give agents a single discriminated node type instead of loosely
//          typed records, and give the validator a flat, arena-indexed graph
//          instead of a pointer structure.
// Dependencies: serde
// ============================================================================

//! The submitted unit of intended work, represented as a dependency graph of typed nodes.

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::ids::AgentId;
use crate::core::ids::CommitGateId;
use crate::core::ids::NodeId;
use crate::core::ids::PackRef;
use crate::core::ids::RunSessionId;
use crate::core::ids::StrategyId;
use crate::core::ids::WorkId;

/// Declares which acceptance criteria and modules a change node is allowed
/// to touch, and which it is explicitly declared out of bounds for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AtomicityBoundary {
    /// Acceptance criteria ids this node is responsible for satisfying.
    #[serde(default)]
    pub in_scope_acceptance_criteria_ids: Vec<String>,
    /// Acceptance criteria ids this node explicitly does not address.
    #[serde(default)]
    pub out_of_scope_acceptance_criteria_ids: Vec<String>,
    /// Modules this node is allowed to modify.
    #[serde(default)]
    pub in_scope_modules: Vec<String>,
    /// Modules this node must not modify.
    #[serde(default)]
    pub out_of_scope_modules: Vec<String>,
}

/// Evidence thresholds a plan's change nodes must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidencePolicy {
    /// Minimum count of distinct evidence sources a change node must cite.
    pub min_distinct_sources: u32,
    /// Whether a single source is acceptable when paired with an explicit guard.
    pub allow_single_source_with_guard: bool,
    /// Minimum count of requirement-origin sources (tickets, specs), if set.
    #[serde(default)]
    pub min_requirement_sources: Option<u32>,
    /// Minimum count of code-origin sources (symbol defs, lexical hits), if set.
    #[serde(default)]
    pub min_code_evidence_sources: Option<u32>,
}

impl Default for EvidencePolicy {
    fn default() -> Self {
        Self {
            min_distinct_sources: 2,
            allow_single_source_with_guard: true,
            min_requirement_sources: None,
            min_code_evidence_sources: None,
        }
    }
}

/// The kind of evidence gathering an escalate node is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceRequestType {
    /// Fetch an external artifact (ticket, spec) not yet in the pack.
    ArtifactFetch,
    /// Expand the knowledge graph traversal depth or breadth.
    GraphExpand,
    /// Rebuild the context pack against a wider file or symbol set.
    PackRebuild,
    /// Widen the scope allowlist.
    ScopeExpand,
}

/// A single piece of evidence gathering an escalate node requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedEvidence {
    /// The kind of evidence gathering requested.
    pub request_type: EvidenceRequestType,
    /// Free-form detail describing exactly what is needed.
    pub detail: String,
}

/// Why a knowledge-gathering strategy step was taken, with its grounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyReason {
    /// Human-readable justification for this strategy choice.
    pub reason: String,
    /// Reference to the evidence that motivated it (file, symbol, or artifact id).
    pub evidence_ref: String,
}

/// A node that edits a file or symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNode {
    /// The kind of edit, e.g. `"add_field"`, `"rename_symbol"`.
    pub operation: String,
    /// File path, relative to the worktree root, this node edits.
    pub target_file: String,
    /// Fully qualified symbols this node edits within the target file.
    #[serde(default)]
    pub target_symbols: Vec<String>,
    /// Why this specific file was chosen over alternatives.
    pub why_this_file: String,
    /// What the edit is intended to accomplish.
    pub edit_intent: String,
    /// Conditions under which this node should escalate rather than apply.
    #[serde(default)]
    pub escalate_if: Vec<String>,
    /// Requirement-origin citations (ticket ids, spec sections).
    #[serde(default)]
    pub citations: Vec<String>,
    /// Code-origin evidence (symbol definitions, lexical search hits).
    #[serde(default)]
    pub code_evidence: Vec<String>,
    /// Artifact ids this node's evidence draws from.
    #[serde(default)]
    pub artifact_refs: Vec<String>,
    /// Policy ids this node's evidence draws from.
    #[serde(default)]
    pub policy_refs: Vec<String>,
    /// Verification hook names that must pass for this node to be considered done.
    #[serde(default)]
    pub verification_hooks: Vec<String>,
    /// Explicit acknowledgement that evidence is thin and the change still proceeds.
    #[serde(default)]
    pub low_evidence_guard: Option<bool>,
    /// Free-form note explaining the uncertainty behind `low_evidence_guard`.
    #[serde(default)]
    pub uncertainty_note: Option<String>,
    /// Whether this node should be routed to a human before it applies.
    #[serde(default)]
    pub requires_human_review: Option<bool>,
}

/// A node that verifies the effect of one or more change nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateNode {
    /// Verification hook names this node runs.
    pub verification_hooks: Vec<String>,
    /// The change nodes this validation covers.
    pub maps_to_node_ids: Vec<NodeId>,
    /// Plain-language criteria that must hold for this node to pass.
    #[serde(default)]
    pub success_criteria: Vec<String>,
}

/// A node that asks the controller for more evidence before the plan can proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalateNode {
    /// The evidence this node is requesting.
    pub requested_evidence: Vec<RequestedEvidence>,
    /// Why the plan cannot proceed without this evidence.
    pub blocking_reasons: Vec<String>,
}

/// A node that performs an effect outside the worktree, gated on human approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectNode {
    /// The kind of side effect, e.g. `"deploy"`, `"notify"`, `"create_ticket"`.
    pub side_effect_type: String,
    /// Reference to the payload this side effect will send.
    pub side_effect_payload_ref: String,
    /// The commit gate a human must have approved for this node to run.
    pub commit_gate_id: CommitGateId,
}

/// The kind-specific payload of a plan node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanNodeKind {
    /// Edits a file or symbol.
    Change(ChangeNode),
    /// Verifies the effect of prior change nodes.
    Validate(ValidateNode),
    /// Requests more evidence before the plan can proceed.
    Escalate(EscalateNode),
    /// Performs a gated effect outside the worktree.
    SideEffect(SideEffectNode),
}

/// A single node in a plan graph.
///
/// Every node shares identity, dependency, and boundary fields regardless of
/// kind; `kind` carries the fields specific to what the node does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNode {
    /// Identifies this node within its plan graph.
    pub node_id: NodeId,
    /// Node ids that must complete before this node is eligible.
    #[serde(default)]
    pub depends_on: Vec<NodeId>,
    /// Failure signatures this node is known to be able to produce.
    #[serde(default)]
    pub expected_failure_signatures: Vec<String>,
    /// The boundary this node declares itself bound by.
    #[serde(default)]
    pub atomicity_boundary: AtomicityBoundary,
    /// The kind-specific payload.
    #[serde(flatten)]
    pub kind: PlanNodeKind,
}

/// A complete submitted unit of intended work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanGraphDocument {
    /// The unit of work this plan addresses.
    pub work_id: WorkId,
    /// The agent submitting this plan.
    pub agent_id: AgentId,
    /// The session this plan was submitted under.
    pub run_session_id: RunSessionId,
    /// Identifies the repository snapshot the plan was built against.
    pub repo_snapshot_id: String,
    /// Absolute path to the worktree root this plan's file paths are relative to.
    pub worktree_root: String,
    /// The context pack this plan's evidence was drawn from.
    pub context_pack_ref: PackRef,
    /// The hash of the context pack at submission time.
    pub context_pack_hash: HashDigest,
    /// Opaque reference to the scope allowlist in force, if narrowed.
    #[serde(default)]
    pub scope_allowlist_ref: Option<String>,
    /// The knowledge-gathering strategy selected for this plan.
    pub knowledge_strategy_id: StrategyId,
    /// Why each strategy decision was made.
    #[serde(default)]
    pub strategy_reasons: Vec<StrategyReason>,
    /// Canonical hash of this document, set once validation accepts it.
    #[serde(default)]
    pub plan_fingerprint: Option<HashDigest>,
    /// Schema version this document was authored against.
    pub schema_version: String,
    /// Evidence thresholds this plan's change nodes must satisfy.
    pub evidence_policy: EvidencePolicy,
    /// Free-form references this plan's reasoning traces back to.
    #[serde(default)]
    pub source_trace_refs: Vec<String>,
    /// The nodes making up this plan's dependency graph.
    pub nodes: Vec<PlanNode>,
}

impl PlanGraphDocument {
    /// Returns the canonical hash of this document with `plan_fingerprint`
    /// cleared, so the fingerprint does not hash itself.
    ///
    /// # Errors
    ///
    /// Returns a hashing error if canonicalization fails.
    pub fn compute_fingerprint(
        &self,
        algorithm: crate::core::hashing::HashAlgorithm,
    ) -> Result<HashDigest, crate::core::hashing::HashError> {
        let mut unfingerprinted = self.clone();
        unfingerprinted.plan_fingerprint = None;
        crate::core::hashing::hash_canonical_json(algorithm, &unfingerprinted)
    }

    /// Returns the node with the given id, if present.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&PlanNode> {
        self.nodes.iter().find(|node| &node.node_id == node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hashing::HashAlgorithm;

    fn sample_plan() -> PlanGraphDocument {
        PlanGraphDocument {
            work_id: WorkId::new("work-1"),
            agent_id: AgentId::new("agent-1"),
            run_session_id: RunSessionId::new("sess-1"),
            repo_snapshot_id: "snap-1".to_owned(),
            worktree_root: "/work".to_owned(),
            context_pack_ref: PackRef::new("pack-1"),
            context_pack_hash: crate::core::hashing::hash_bytes(HashAlgorithm::Sha256, b""),
            scope_allowlist_ref: None,
            knowledge_strategy_id: StrategyId::new("strategy-1"),
            strategy_reasons: Vec::new(),
            plan_fingerprint: None,
            schema_version: "1".to_owned(),
            evidence_policy: EvidencePolicy::default(),
            source_trace_refs: Vec::new(),
            nodes: vec![PlanNode {
                node_id: NodeId::new("n1"),
                depends_on: Vec::new(),
                expected_failure_signatures: Vec::new(),
                atomicity_boundary: AtomicityBoundary::default(),
                kind: PlanNodeKind::Change(ChangeNode {
                    operation: "add_field".to_owned(),
                    target_file: "src/lib.rs".to_owned(),
                    target_symbols: Vec::new(),
                    why_this_file: "owns the struct".to_owned(),
                    edit_intent: "add a field".to_owned(),
                    escalate_if: Vec::new(),
                    citations: vec!["TICKET-1".to_owned()],
                    code_evidence: vec!["src/lib.rs:10".to_owned()],
                    artifact_refs: Vec::new(),
                    policy_refs: Vec::new(),
                    verification_hooks: Vec::new(),
                    low_evidence_guard: None,
                    uncertainty_note: None,
                    requires_human_review: None,
                }),
            }],
        }
    }

    #[test]
    fn fingerprint_is_stable_across_repeated_computation() {
        let plan = sample_plan();
        let a = plan.compute_fingerprint(HashAlgorithm::Sha256).expect("hashes");
        let b = plan.compute_fingerprint(HashAlgorithm::Sha256).expect("hashes");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_does_not_depend_on_a_previously_set_fingerprint() {
        let mut plan = sample_plan();
        let without = plan.compute_fingerprint(HashAlgorithm::Sha256).expect("hashes");
        plan.plan_fingerprint = Some(without.clone());
        let with = plan.compute_fingerprint(HashAlgorithm::Sha256).expect("hashes");
        assert_eq!(without, with);
    }

    #[test]
    fn node_lookup_finds_the_matching_id() {
        let plan = sample_plan();
        assert!(plan.node(&NodeId::new("n1")).is_some());
        assert!(plan.node(&NodeId::new("missing")).is_none());
    }

    #[test]
    fn change_node_round_trips_through_tagged_json() {
        let plan = sample_plan();
        let json = serde_json::to_string(&plan).expect("serializes");
        let back: PlanGraphDocument = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, plan);
    }
}
