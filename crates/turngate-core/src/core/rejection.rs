// turngate-core/src/core/rejection.rs
// ============================================================================
// Module: Rejection Codes
// Description: The stable catalog of reasons a verb or plan may be denied.
// Purpose: Give every deny path a machine-stable code plus a remediation hint
//          an agent can act on without a human in the loop.
// Dependencies: serde
// ============================================================================

//! The stable catalog of reasons a verb or plan may be denied.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A stable, documented reason a verb call or plan submission was denied.
///
/// Codes are never renumbered or reused for a different meaning; new ones
/// are only ever added. The first thirteen are the plan-graph validator's
/// public contract; the remaining two are dispatcher-level gates that sit
/// outside plan validation (state routing and budget).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    /// A required envelope or node field was empty or absent.
    PlanMissingRequiredFields,
    /// A change node's edit crosses its own declared atomicity boundary.
    PlanNotAtomic,
    /// A target file, symbol, or path falls outside the scope allowlist.
    PlanScopeViolation,
    /// A migration-strategy plan is missing its required migration citation.
    PlanStrategyMismatch,
    /// A change node cites fewer distinct evidence sources than required.
    PlanEvidenceInsufficient,
    /// A node's verification coverage does not meet its kind's requirements.
    PlanVerificationWeak,
    /// A memory or graph-derived enforcement rule would be violated.
    PlanPolicyViolation,
    /// A side effect node's commit gate has not been approved.
    ExecUngatedSideEffect,
    /// A citation requiring an artifact reference is missing one.
    PlanMissingArtifactRef,
    /// A migration-strategy plan is missing a required migration rule citation.
    PlanMigrationRuleMissing,
    /// A file read falls outside the session's gathered context pack.
    PackScopeViolation,
    /// The context pack lacks evidence for anchors the plan references.
    PackInsufficient,
    /// `signal_task_complete` was called with plan nodes still incomplete.
    WorkIncomplete,
    /// The session's current state does not permit this verb.
    VerbNotAllowedInState,
    /// The token budget gate has tripped.
    BudgetExhausted,
}

impl RejectionCode {
    /// All known codes, in declaration order.
    pub const ALL: [RejectionCode; 15] = [
        RejectionCode::PlanMissingRequiredFields,
        RejectionCode::PlanNotAtomic,
        RejectionCode::PlanScopeViolation,
        RejectionCode::PlanStrategyMismatch,
        RejectionCode::PlanEvidenceInsufficient,
        RejectionCode::PlanVerificationWeak,
        RejectionCode::PlanPolicyViolation,
        RejectionCode::ExecUngatedSideEffect,
        RejectionCode::PlanMissingArtifactRef,
        RejectionCode::PlanMigrationRuleMissing,
        RejectionCode::PackScopeViolation,
        RejectionCode::PackInsufficient,
        RejectionCode::WorkIncomplete,
        RejectionCode::VerbNotAllowedInState,
        RejectionCode::BudgetExhausted,
    ];

    /// The SCREAMING_SNAKE_CASE wire form of this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionCode::PlanMissingRequiredFields => "PLAN_MISSING_REQUIRED_FIELDS",
            RejectionCode::PlanNotAtomic => "PLAN_NOT_ATOMIC",
            RejectionCode::PlanScopeViolation => "PLAN_SCOPE_VIOLATION",
            RejectionCode::PlanStrategyMismatch => "PLAN_STRATEGY_MISMATCH",
            RejectionCode::PlanEvidenceInsufficient => "PLAN_EVIDENCE_INSUFFICIENT",
            RejectionCode::PlanVerificationWeak => "PLAN_VERIFICATION_WEAK",
            RejectionCode::PlanPolicyViolation => "PLAN_POLICY_VIOLATION",
            RejectionCode::ExecUngatedSideEffect => "EXEC_UNGATED_SIDE_EFFECT",
            RejectionCode::PlanMissingArtifactRef => "PLAN_MISSING_ARTIFACT_REF",
            RejectionCode::PlanMigrationRuleMissing => "PLAN_MIGRATION_RULE_MISSING",
            RejectionCode::PackScopeViolation => "PACK_SCOPE_VIOLATION",
            RejectionCode::PackInsufficient => "PACK_INSUFFICIENT",
            RejectionCode::WorkIncomplete => "WORK_INCOMPLETE",
            RejectionCode::VerbNotAllowedInState => "VERB_NOT_ALLOWED_IN_STATE",
            RejectionCode::BudgetExhausted => "BUDGET_EXHAUSTED",
        }
    }

    /// A short remediation an agent can act on without human input.
    #[must_use]
    pub fn remediation(self) -> &'static str {
        match self {
            RejectionCode::PlanMissingRequiredFields => {
                "fill in the missing required field(s) named in this response and resubmit"
            }
            RejectionCode::PlanNotAtomic => {
                "split the change so it touches only its declared in-scope modules"
            }
            RejectionCode::PlanScopeViolation => {
                "narrow the change to files and symbols inside the scope allowlist"
            }
            RejectionCode::PlanStrategyMismatch => {
                "the plan's node shape does not match its declared knowledge strategy"
            }
            RejectionCode::PlanEvidenceInsufficient => {
                "gather additional distinct evidence sources via request_evidence_guidance"
            }
            RejectionCode::PlanVerificationWeak => {
                "add the verification coverage this node's kind requires"
            }
            RejectionCode::PlanPolicyViolation => {
                "the change conflicts with a rule learned from memory or the graph; adjust the plan"
            }
            RejectionCode::ExecUngatedSideEffect => {
                "obtain human approval for the referenced commit gate before resubmitting"
            }
            RejectionCode::PlanMissingArtifactRef => {
                "add the artifact reference this citation requires"
            }
            RejectionCode::PlanMigrationRuleMissing => {
                "add a migration-prefixed citation to every change node for this strategy"
            }
            RejectionCode::PackScopeViolation => {
                "the file is outside the gathered context pack; widen the pack before reading it"
            }
            RejectionCode::PackInsufficient => {
                "gather evidence for the missing anchors named in this response before resubmitting"
            }
            RejectionCode::WorkIncomplete => {
                "finish the remaining plan nodes named in this response before signaling completion"
            }
            RejectionCode::VerbNotAllowedInState => {
                "call list_available_verbs to see what this session currently permits"
            }
            RejectionCode::BudgetExhausted => {
                "the session token budget is spent; wait for budget release or signal_task_complete"
            }
        }
    }
}

impl fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_has_a_non_empty_remediation() {
        for code in RejectionCode::ALL {
            assert!(!code.remediation().is_empty());
        }
    }

    #[test]
    fn wire_form_is_screaming_snake_case() {
        let json = serde_json::to_string(&RejectionCode::PlanScopeViolation).expect("serializes");
        assert_eq!(json, "\"PLAN_SCOPE_VIOLATION\"");
    }
}
