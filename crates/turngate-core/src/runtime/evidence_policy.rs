// turngate-core/src/runtime/evidence_policy.rs
// ============================================================================
// Module: Evidence Policy Engine
// Description: Checks a change node's citations against a plan's evidence
//              policy thresholds.
// Purpose: Give the validator a single, pure decision function for the
//          "enough distinct evidence" requirement.
// Dependencies: crate::core
// ============================================================================

//! Checks a change node's citations against a plan's evidence policy thresholds.

use std::collections::BTreeSet;

use crate::core::ChangeNode;
use crate::core::EvidencePolicy;
use crate::core::RejectionCode;

/// Counts the distinct evidence sources a change node cites.
///
/// Citations, code evidence, and policy refs are each treated as distinct
/// sources; duplicates within or across those lists count once.
#[must_use]
pub fn distinct_source_count(node: &ChangeNode) -> usize {
    let mut sources: BTreeSet<&str> = BTreeSet::new();
    sources.extend(node.citations.iter().map(String::as_str));
    sources.extend(node.code_evidence.iter().map(String::as_str));
    sources.extend(node.policy_refs.iter().map(String::as_str));
    sources.len()
}

fn requirement_source_count(node: &ChangeNode) -> usize {
    let mut sources: BTreeSet<&str> = BTreeSet::new();
    sources.extend(node.citations.iter().map(String::as_str));
    sources.extend(node.artifact_refs.iter().map(String::as_str));
    sources.len()
}

/// Evaluates whether a change node satisfies `policy`'s evidence thresholds.
///
/// # Errors
///
/// Returns [`RejectionCode::PlanEvidenceInsufficient`] when the node falls short
/// and no low-evidence guard is present to excuse it.
pub fn evaluate_change_evidence(
    node: &ChangeNode,
    policy: &EvidencePolicy,
) -> Result<(), RejectionCode> {
    let distinct = distinct_source_count(node);

    if distinct < policy.min_distinct_sources as usize {
        let guarded = policy.allow_single_source_with_guard
            && distinct >= 1
            && node.low_evidence_guard == Some(true)
            && node.uncertainty_note.as_deref().is_some_and(|note| !note.is_empty())
            && node.requires_human_review == Some(true);
        if !guarded {
            return Err(RejectionCode::PlanEvidenceInsufficient);
        }
    }

    if let Some(min_requirement) = policy.min_requirement_sources {
        if requirement_source_count(node) < min_requirement as usize {
            return Err(RejectionCode::PlanEvidenceInsufficient);
        }
    }

    if let Some(min_code) = policy.min_code_evidence_sources {
        if node.code_evidence.len() < min_code as usize {
            return Err(RejectionCode::PlanEvidenceInsufficient);
        }
    }

    Ok(())
}
