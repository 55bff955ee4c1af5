// turngate-contract/src/examples.rs
// ============================================================================
// Module: Contract Examples
// Description: Canonical example payloads shipped with the contract bundle.
// Purpose: Give client authors a known-good plan document to start from.
// Dependencies: serde_json
// ============================================================================

//! Canonical example payloads shipped with the contract bundle, giving
//! client authors a known-good plan document to start from.

use serde_json::Value;
use serde_json::json;

/// Returns the minimal plan graph document the validator accepts: one change
/// node, one validate node mapping to it, both with non-empty boundaries.
///
/// The suite deserializes this through the core types and runs it through
/// the real validator, so the example can never drift into rejection.
#[must_use]
pub fn minimal_plan_example() -> Value {
    json!({
        "work_id": "work-example-1",
        "agent_id": "agent-example-1",
        "run_session_id": "sess-example-1",
        "repo_snapshot_id": "snap-0001",
        "worktree_root": "/work/checkout",
        "context_pack_ref": "sess-example-1-pack",
        "context_pack_hash": {
            "algorithm": "sha256",
            "value": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        "scope_allowlist_ref": null,
        "knowledge_strategy_id": "default",
        "strategy_reasons": [
            { "reason": "no special signals matched", "evidence_ref": "prompt" }
        ],
        "plan_fingerprint": null,
        "schema_version": "1",
        "evidence_policy": {
            "min_distinct_sources": 2,
            "allow_single_source_with_guard": true,
            "min_requirement_sources": null,
            "min_code_evidence_sources": null,
        },
        "source_trace_refs": ["trace-0001"],
        "nodes": [
            {
                "node_id": "change-1",
                "depends_on": [],
                "expected_failure_signatures": [],
                "atomicity_boundary": {
                    "in_scope_acceptance_criteria_ids": ["AC-1"],
                    "out_of_scope_acceptance_criteria_ids": [],
                    "in_scope_modules": ["src/widgets"],
                    "out_of_scope_modules": [],
                },
                "kind": "change",
                "operation": "add_field",
                "target_file": "src/widgets/factory.ts",
                "target_symbols": ["WidgetFactory.build"],
                "why_this_file": "owns the factory the ticket names",
                "edit_intent": "add the colour option to the build signature",
                "escalate_if": ["the factory is generated code"],
                "citations": ["TICKET-101"],
                "code_evidence": ["src/widgets/factory.ts:42"],
                "artifact_refs": [],
                "policy_refs": [],
                "verification_hooks": ["widget_factory_unit"],
            },
            {
                "node_id": "validate-1",
                "depends_on": ["change-1"],
                "expected_failure_signatures": [],
                "atomicity_boundary": {
                    "in_scope_acceptance_criteria_ids": ["AC-1"],
                    "out_of_scope_acceptance_criteria_ids": [],
                    "in_scope_modules": ["src/widgets"],
                    "out_of_scope_modules": [],
                },
                "kind": "validate",
                "verification_hooks": ["widget_factory_unit"],
                "maps_to_node_ids": ["change-1"],
                "success_criteria": ["the new colour option round-trips"],
            }
        ],
    })
}
