// turngate-core/src/runtime/validator.rs
// ============================================================================
// Module: Plan Graph Validator
// Description: Runs a plan graph through seven ordered passes and produces a
//              deduped rejection-code list.
// Purpose: Give submit_execution_plan a single authoritative accept/reject
//          decision, with every violated invariant enumerated rather than
//          short-circuiting on the first failure.
// Dependencies: crate::core, crate::runtime::{evidence_policy, scope}
// ============================================================================

//! Runs a plan graph through seven ordered passes and produces a deduped rejection-code list.

use std::collections::BTreeSet;

use crate::core::ChangeNode;
use crate::core::EnforcementBundle;
use crate::core::EnforcementRule;
use crate::core::NodeId;
use crate::core::PlanGraphDocument;
use crate::core::PlanNode;
use crate::core::PlanNodeKind;
use crate::core::RejectionCode;
use crate::runtime::evidence_policy::evaluate_change_evidence;

/// The strategy id whose plans must cite migration rules on every change node.
pub const MIGRATION_STRATEGY_ID: &str = "migration_adp_to_sdf";

/// Codemod ids a `codemod:`-prefixed citation may reference. A citation
/// naming anything outside this catalog is a policy violation, not a typo to
/// be waved through.
pub const SUPPORTED_CODEMODS: [&str; 3] =
    ["rename_symbol", "inline_template_extract", "adp_grid_to_sdf_table"];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Runs every validator pass over `plan` and returns the deduped, ordered
/// set of rejection codes. The plan is accepted iff the result is empty.
#[must_use]
pub fn validate(plan: &PlanGraphDocument, enforcement: &EnforcementBundle) -> Vec<RejectionCode> {
    let mut codes: Vec<RejectionCode> = Vec::new();
    let mut seen: BTreeSet<RejectionCode> = BTreeSet::new();
    let mut push = |codes: &mut Vec<RejectionCode>, seen: &mut BTreeSet<RejectionCode>, code: RejectionCode| {
        if seen.insert(code) {
            codes.push(code);
        }
    };

    pass_envelope(plan, &mut codes, &mut seen, &mut push);
    pass_graph(plan, &mut codes, &mut seen, &mut push);
    pass_strategy_reasons(plan, &mut codes, &mut seen, &mut push);
    pass_per_node(plan, &mut codes, &mut seen, &mut push);
    pass_enforcement_rules(plan, &enforcement.memory_plan_rules, &mut codes, &mut seen, &mut push);
    pass_enforcement_rules(plan, &enforcement.graph_policy_rules, &mut codes, &mut seen, &mut push);
    pass_migration_citation(plan, &mut codes, &mut seen, &mut push);

    codes
}

type Push<'a> = dyn FnMut(&mut Vec<RejectionCode>, &mut BTreeSet<RejectionCode>, RejectionCode) + 'a;

/// Pass 1: every required envelope string is non-empty and strategy reasons
/// and source trace refs were supplied at all.
fn pass_envelope(
    plan: &PlanGraphDocument,
    codes: &mut Vec<RejectionCode>,
    seen: &mut BTreeSet<RejectionCode>,
    push: &mut Push<'_>,
) {
    let required_non_empty = [
        plan.work_id.as_str(),
        plan.agent_id.as_str(),
        plan.run_session_id.as_str(),
        plan.repo_snapshot_id.as_str(),
        plan.worktree_root.as_str(),
        plan.context_pack_ref.as_str(),
        plan.knowledge_strategy_id.as_str(),
        plan.schema_version.as_str(),
    ];
    if required_non_empty.iter().any(|field| field.is_empty())
        || plan.source_trace_refs.is_empty()
        || plan.strategy_reasons.is_empty()
    {
        push(codes, seen, RejectionCode::PlanMissingRequiredFields);
    }
}

/// Pass 2: unique node ids, resolvable dependencies, no cycles, every
/// change covered by a validate node, every side effect depending on a
/// validate node.
fn pass_graph(
    plan: &PlanGraphDocument,
    codes: &mut Vec<RejectionCode>,
    seen: &mut BTreeSet<RejectionCode>,
    push: &mut Push<'_>,
) {
    let mut ids: BTreeSet<&NodeId> = BTreeSet::new();
    let mut duplicate_ids = false;
    for node in &plan.nodes {
        if !ids.insert(&node.node_id) {
            duplicate_ids = true;
        }
    }
    if duplicate_ids {
        push(codes, seen, RejectionCode::PlanMissingRequiredFields);
    }

    let mut unresolved_dependency = false;
    for node in &plan.nodes {
        for dep in &node.depends_on {
            if plan.node(dep).is_none() {
                unresolved_dependency = true;
            }
        }
    }
    if unresolved_dependency {
        push(codes, seen, RejectionCode::PlanMissingRequiredFields);
    }

    if has_cycle(plan) {
        push(codes, seen, RejectionCode::PlanNotAtomic);
    }

    let mut covered_changes: BTreeSet<&NodeId> = BTreeSet::new();
    for node in &plan.nodes {
        if let PlanNodeKind::Validate(validate) = &node.kind {
            for mapped in &validate.maps_to_node_ids {
                covered_changes.insert(mapped);
            }
        }
    }
    let every_change_covered = plan
        .nodes
        .iter()
        .filter(|node| matches!(node.kind, PlanNodeKind::Change(_)))
        .all(|node| covered_changes.contains(&node.node_id));
    if !every_change_covered {
        push(codes, seen, RejectionCode::PlanVerificationWeak);
    }

    let validate_ids: BTreeSet<&NodeId> = plan
        .nodes
        .iter()
        .filter(|node| matches!(node.kind, PlanNodeKind::Validate(_)))
        .map(|node| &node.node_id)
        .collect();
    let every_side_effect_gated = plan
        .nodes
        .iter()
        .filter(|node| matches!(node.kind, PlanNodeKind::SideEffect(_)))
        .all(|node| node.depends_on.iter().any(|dep| validate_ids.contains(dep)));
    if !every_side_effect_gated {
        push(codes, seen, RejectionCode::ExecUngatedSideEffect);
    }
}

fn has_cycle(plan: &PlanGraphDocument) -> bool {
    let mut colors: std::collections::BTreeMap<&NodeId, Color> = plan
        .nodes
        .iter()
        .map(|node| (&node.node_id, Color::White))
        .collect();

    fn visit<'a>(
        node_id: &'a NodeId,
        plan: &'a PlanGraphDocument,
        colors: &mut std::collections::BTreeMap<&'a NodeId, Color>,
    ) -> bool {
        match colors.get(node_id) {
            Some(Color::Black) => return false,
            Some(Color::Gray) => return true,
            _ => {}
        }
        colors.insert(node_id, Color::Gray);
        if let Some(node) = plan.node(node_id) {
            for dep in &node.depends_on {
                if plan.node(dep).is_some() && visit(dep, plan, colors) {
                    return true;
                }
            }
        }
        colors.insert(node_id, Color::Black);
        false
    }

    let ids: Vec<&NodeId> = plan.nodes.iter().map(|node| &node.node_id).collect();
    for id in ids {
        if colors.get(id) == Some(&Color::White) && visit(id, plan, &mut colors) {
            return true;
        }
    }
    false
}

/// Pass 3: every strategy reason has both fields populated.
fn pass_strategy_reasons(
    plan: &PlanGraphDocument,
    codes: &mut Vec<RejectionCode>,
    seen: &mut BTreeSet<RejectionCode>,
    push: &mut Push<'_>,
) {
    let all_populated = plan
        .strategy_reasons
        .iter()
        .all(|reason| !reason.reason.is_empty() && !reason.evidence_ref.is_empty());
    if !all_populated {
        push(codes, seen, RejectionCode::PlanMissingRequiredFields);
    }
}

/// Pass 4: per-node-kind structural and evidence requirements.
fn pass_per_node(
    plan: &PlanGraphDocument,
    codes: &mut Vec<RejectionCode>,
    seen: &mut BTreeSet<RejectionCode>,
    push: &mut Push<'_>,
) {
    for node in &plan.nodes {
        if node.atomicity_boundary.in_scope_acceptance_criteria_ids.is_empty()
            || node.atomicity_boundary.in_scope_modules.is_empty()
        {
            push(codes, seen, RejectionCode::PlanNotAtomic);
        }
        match &node.kind {
            PlanNodeKind::Change(change) => {
                check_change_node(change, &node.atomicity_boundary, &plan.evidence_policy, codes, seen, push);
            }
            PlanNodeKind::Validate(validate) => {
                if validate.verification_hooks.is_empty()
                    || validate.maps_to_node_ids.is_empty()
                    || validate.success_criteria.is_empty()
                {
                    push(codes, seen, RejectionCode::PlanVerificationWeak);
                }
            }
            PlanNodeKind::Escalate(escalate) => {
                if escalate.blocking_reasons.is_empty() || escalate.requested_evidence.is_empty() {
                    push(codes, seen, RejectionCode::PlanMissingRequiredFields);
                }
            }
            PlanNodeKind::SideEffect(side_effect) => {
                if side_effect.side_effect_type.is_empty()
                    || side_effect.side_effect_payload_ref.is_empty()
                    || side_effect.commit_gate_id.as_str().is_empty()
                {
                    push(codes, seen, RejectionCode::PlanMissingRequiredFields);
                }
            }
        }
    }
}

fn is_symbol_creation(change: &ChangeNode) -> bool {
    change.operation.contains("create") || change.operation.contains("add_symbol")
}

fn check_change_node(
    change: &ChangeNode,
    atomicity_boundary: &crate::core::AtomicityBoundary,
    evidence_policy: &crate::core::EvidencePolicy,
    codes: &mut Vec<RejectionCode>,
    seen: &mut BTreeSet<RejectionCode>,
    push: &mut Push<'_>,
) {
    if change.operation.is_empty()
        || change.target_file.is_empty()
        || change.why_this_file.is_empty()
        || change.edit_intent.is_empty()
        || change.escalate_if.is_empty()
        || change.verification_hooks.is_empty()
    {
        push(codes, seen, RejectionCode::PlanMissingRequiredFields);
    }

    if change.target_symbols.is_empty() && !is_symbol_creation(change) {
        push(codes, seen, RejectionCode::PlanMissingRequiredFields);
    }

    let attachment_citations_missing_artifact = change
        .citations
        .iter()
        .any(|citation| citation.starts_with("inbox:") || citation.starts_with("attachment:"))
        && change.artifact_refs.is_empty();
    if attachment_citations_missing_artifact {
        push(codes, seen, RejectionCode::PlanMissingArtifactRef);
    }

    let unknown_codemod = change
        .citations
        .iter()
        .filter_map(|citation| citation.strip_prefix("codemod:"))
        .any(|id| !SUPPORTED_CODEMODS.contains(&id));
    if unknown_codemod {
        push(codes, seen, RejectionCode::PlanPolicyViolation);
    }

    if evaluate_change_evidence(change, evidence_policy).is_err() {
        push(codes, seen, RejectionCode::PlanEvidenceInsufficient);
    }

    if node_out_of_atomicity_bounds(change, atomicity_boundary) {
        push(codes, seen, RejectionCode::PlanNotAtomic);
    }
}

fn node_out_of_atomicity_bounds(
    change: &ChangeNode,
    boundary: &crate::core::AtomicityBoundary,
) -> bool {
    if boundary.out_of_scope_modules.is_empty() {
        return false;
    }
    boundary
        .out_of_scope_modules
        .iter()
        .any(|module| change.target_file.starts_with(module.as_str()))
}

/// Returns true if `target` matches `pattern` as a plain substring.
fn matches_pattern(target: &str, pattern: Option<&str>) -> bool {
    pattern.is_none_or(|pattern| target.contains(pattern))
}

fn required_step_satisfied(step: &crate::core::RequiredStep, node: &PlanNode) -> bool {
    match (step.kind.as_str(), &node.kind) {
        ("change", PlanNodeKind::Change(change)) => {
            matches_pattern(&change.target_file, step.target_pattern.as_deref())
                || change
                    .target_symbols
                    .iter()
                    .any(|symbol| matches_pattern(symbol, step.target_pattern.as_deref()))
        }
        ("validate", PlanNodeKind::Validate(validate)) => validate
            .verification_hooks
            .iter()
            .any(|hook| matches_pattern(hook, step.target_pattern.as_deref())),
        ("verification_hook", PlanNodeKind::Change(change)) => change
            .verification_hooks
            .iter()
            .any(|hook| matches_pattern(hook, step.target_pattern.as_deref())),
        ("citation", PlanNodeKind::Change(change)) => change
            .citations
            .iter()
            .any(|citation| matches_pattern(citation, step.target_pattern.as_deref())),
        _ => false,
    }
}

/// Passes 5 and 6 share this matching logic: every required step of every
/// enforcement rule must be satisfied by at least one node in the plan.
fn pass_enforcement_rules(
    plan: &PlanGraphDocument,
    rules: &[EnforcementRule],
    codes: &mut Vec<RejectionCode>,
    seen: &mut BTreeSet<RejectionCode>,
    push: &mut Push<'_>,
) {
    for rule in rules {
        let applies = plan.nodes.iter().any(|node| match &node.kind {
            PlanNodeKind::Change(change) => change.target_file.contains(&rule.condition)
                || change.target_symbols.iter().any(|s| s.contains(&rule.condition)),
            _ => false,
        });
        if !applies {
            continue;
        }
        let all_satisfied = rule
            .required_steps
            .iter()
            .all(|step| plan.nodes.iter().any(|node| required_step_satisfied(step, node)));
        if !all_satisfied {
            push(codes, seen, RejectionCode::PlanPolicyViolation);
        }
    }
}

/// Pass 7: migration-strategy plans must cite a migration rule on every
/// change node.
fn pass_migration_citation(
    plan: &PlanGraphDocument,
    codes: &mut Vec<RejectionCode>,
    seen: &mut BTreeSet<RejectionCode>,
    push: &mut Push<'_>,
) {
    if plan.knowledge_strategy_id.as_str() != MIGRATION_STRATEGY_ID {
        return;
    }
    let every_change_cites_migration = plan
        .nodes
        .iter()
        .filter_map(|node| match &node.kind {
            PlanNodeKind::Change(change) => Some(change),
            _ => None,
        })
        .all(|change| {
            change.policy_refs.iter().any(|r| r.starts_with("migration:"))
                || change.citations.iter().any(|r| r.starts_with("migration:"))
        });
    if !every_change_cites_migration {
        push(codes, seen, RejectionCode::PlanMigrationRuleMissing);
    }
}
