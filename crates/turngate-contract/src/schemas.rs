// turngate-contract/src/schemas.rs
// ============================================================================
// Module: Contract Schemas
// Description: JSON Schemas for the plan graph document and the response
//              envelope.
// Purpose: Give clients machine-checkable shapes for the two documents that
//          cross the wire in both directions.
// Dependencies: turngate-core, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Schemas are authored here rather than derived, so the published contract
//! stays stable even when internal types gain private fields. The builder
//! compile-checks every schema before it is written; an invalid schema is a
//! build failure, not a published artifact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::ContractError;

// ============================================================================
// SECTION: Schema Builders
// ============================================================================

/// Compile-checks `schema` as a JSON Schema.
///
/// # Errors
///
/// Returns [`ContractError::InvalidSchema`] when the schema does not compile.
pub fn compile_check(schema: &Value) -> Result<(), ContractError> {
    jsonschema::validator_for(schema)
        .map(|_| ())
        .map_err(|err| ContractError::InvalidSchema(err.to_string()))
}

/// Schema fragment for a non-empty string.
fn non_empty_string() -> Value {
    json!({ "type": "string", "minLength": 1 })
}

/// Schema fragment for an array of strings.
fn string_array() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

/// Schema fragment for a canonical hash digest.
fn hash_digest() -> Value {
    json!({
        "type": "object",
        "properties": {
            "algorithm": { "type": "string", "enum": ["sha256"] },
            "value": { "type": "string", "pattern": "^[0-9a-f]+$" },
        },
        "required": ["algorithm", "value"],
        "additionalProperties": false,
    })
}

/// Schema fragment for the boundary every plan node declares.
fn atomicity_boundary() -> Value {
    json!({
        "type": "object",
        "properties": {
            "in_scope_acceptance_criteria_ids": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
            "out_of_scope_acceptance_criteria_ids": string_array(),
            "in_scope_modules": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
            "out_of_scope_modules": string_array(),
        },
        "required": ["in_scope_acceptance_criteria_ids", "in_scope_modules"],
    })
}

/// Schema fragment shared by every plan node kind.
fn node_common_properties() -> serde_json::Map<String, Value> {
    let mut properties = serde_json::Map::new();
    properties.insert("node_id".to_owned(), non_empty_string());
    properties.insert("depends_on".to_owned(), string_array());
    properties.insert("expected_failure_signatures".to_owned(), string_array());
    properties.insert("atomicity_boundary".to_owned(), atomicity_boundary());
    properties.insert("kind".to_owned(), json!({
        "type": "string",
        "enum": ["change", "validate", "escalate", "side_effect"],
    }));
    properties
}

/// Returns the JSON Schema for a single plan node, covering all four kinds
/// via a `kind` discriminator and per-kind conditionals.
#[must_use]
pub fn plan_node_schema() -> Value {
    json!({
        "type": "object",
        "properties": node_common_properties(),
        "required": ["node_id", "kind", "atomicity_boundary"],
        "allOf": [
            {
                "if": { "properties": { "kind": { "const": "change" } } },
                "then": {
                    "properties": {
                        "operation": non_empty_string(),
                        "target_file": non_empty_string(),
                        "target_symbols": string_array(),
                        "why_this_file": non_empty_string(),
                        "edit_intent": non_empty_string(),
                        "escalate_if": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                        "citations": string_array(),
                        "code_evidence": string_array(),
                        "artifact_refs": string_array(),
                        "policy_refs": string_array(),
                        "verification_hooks": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                        "low_evidence_guard": { "type": "boolean" },
                        "uncertainty_note": { "type": "string" },
                        "requires_human_review": { "type": "boolean" },
                    },
                    "required": ["operation", "target_file", "why_this_file", "edit_intent", "escalate_if", "verification_hooks"],
                },
            },
            {
                "if": { "properties": { "kind": { "const": "validate" } } },
                "then": {
                    "properties": {
                        "verification_hooks": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                        "maps_to_node_ids": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                        "success_criteria": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                    },
                    "required": ["verification_hooks", "maps_to_node_ids", "success_criteria"],
                },
            },
            {
                "if": { "properties": { "kind": { "const": "escalate" } } },
                "then": {
                    "properties": {
                        "requested_evidence": {
                            "type": "array",
                            "minItems": 1,
                            "items": {
                                "type": "object",
                                "properties": {
                                    "request_type": {
                                        "type": "string",
                                        "enum": ["artifact_fetch", "graph_expand", "pack_rebuild", "scope_expand"],
                                    },
                                    "detail": non_empty_string(),
                                },
                                "required": ["request_type", "detail"],
                            },
                        },
                        "blocking_reasons": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                    },
                    "required": ["requested_evidence", "blocking_reasons"],
                },
            },
            {
                "if": { "properties": { "kind": { "const": "side_effect" } } },
                "then": {
                    "properties": {
                        "side_effect_type": non_empty_string(),
                        "side_effect_payload_ref": non_empty_string(),
                        "commit_gate_id": non_empty_string(),
                    },
                    "required": ["side_effect_type", "side_effect_payload_ref", "commit_gate_id"],
                },
            },
        ],
    })
}

/// Returns the JSON Schema for a complete plan graph document.
#[must_use]
pub fn plan_graph_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "TurngatePlanGraphDocument",
        "type": "object",
        "properties": {
            "work_id": non_empty_string(),
            "agent_id": non_empty_string(),
            "run_session_id": non_empty_string(),
            "repo_snapshot_id": non_empty_string(),
            "worktree_root": non_empty_string(),
            "context_pack_ref": non_empty_string(),
            "context_pack_hash": hash_digest(),
            "scope_allowlist_ref": { "type": ["string", "null"] },
            "knowledge_strategy_id": non_empty_string(),
            "strategy_reasons": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "reason": non_empty_string(),
                        "evidence_ref": non_empty_string(),
                    },
                    "required": ["reason", "evidence_ref"],
                },
            },
            "plan_fingerprint": { "type": ["object", "null"] },
            "schema_version": non_empty_string(),
            "evidence_policy": {
                "type": "object",
                "properties": {
                    "min_distinct_sources": { "type": "integer", "minimum": 1 },
                    "allow_single_source_with_guard": { "type": "boolean" },
                    "min_requirement_sources": { "type": ["integer", "null"] },
                    "min_code_evidence_sources": { "type": ["integer", "null"] },
                },
                "required": ["min_distinct_sources", "allow_single_source_with_guard"],
            },
            "source_trace_refs": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
            "nodes": { "type": "array", "items": plan_node_schema(), "minItems": 1 },
        },
        "required": [
            "work_id", "agent_id", "run_session_id", "repo_snapshot_id", "worktree_root",
            "context_pack_ref", "context_pack_hash", "knowledge_strategy_id",
            "strategy_reasons", "schema_version", "evidence_policy", "source_trace_refs", "nodes",
        ],
    })
}

/// Returns the JSON Schema for the response envelope every verb call returns.
#[must_use]
pub fn response_envelope_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "TurngateResponseEnvelope",
        "type": "object",
        "properties": {
            "run_session_id": non_empty_string(),
            "work_id": non_empty_string(),
            "agent_id": non_empty_string(),
            "state": {
                "type": "string",
                "enum": [
                    "UNINITIALIZED", "PLANNING", "PLAN_REQUIRED", "PLAN_ACCEPTED",
                    "EXECUTION_ENABLED", "BLOCKED_BUDGET", "COMPLETED", "FAILED",
                ],
            },
            "capabilities": string_array(),
            "deny_reasons": string_array(),
            "trace_ref": non_empty_string(),
            "schema_version": non_empty_string(),
            "budget_status": {
                "type": "object",
                "properties": {
                    "max_tokens": { "type": "integer", "minimum": 0 },
                    "used_tokens": { "type": "integer", "minimum": 0 },
                    "threshold_tokens": { "type": "integer", "minimum": 0 },
                    "blocked": { "type": "boolean" },
                },
                "required": ["max_tokens", "used_tokens", "threshold_tokens", "blocked"],
            },
            "worktree_root": { "type": "string" },
            "knowledge_strategy": { "type": ["string", "null"] },
            "sub_agent_hints": string_array(),
            "verb_descriptions": { "type": "object" },
            "result": {},
            "suggested_action": {
                "type": ["object", "null"],
                "properties": {
                    "verb": { "type": "string" },
                    "reason": non_empty_string(),
                },
                "required": ["verb", "reason"],
            },
        },
        "required": [
            "run_session_id", "work_id", "agent_id", "state", "capabilities", "deny_reasons",
            "trace_ref", "schema_version", "budget_status", "worktree_root",
            "verb_descriptions", "result",
        ],
    })
}
