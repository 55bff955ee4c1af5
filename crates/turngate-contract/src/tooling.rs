// turngate-contract/src/tooling.rs
// ============================================================================
// Module: Verb Catalog
// Description: The generated catalog of verbs, argument schemas, and the
//              rejection codes each verb can surface.
// Purpose: Keep the published verb surface in one place so docs, SDKs, and
//          clients all read the same source of truth.
// Dependencies: turngate-core, serde_json
// ============================================================================

//! ## Overview
//! One [`VerbContract`] per verb in [`VerbName::ALL`], in that stable order.
//! Argument names are camelCase on the wire, matching the dispatcher's
//! decoders exactly; a schema drifting from the decoder is a contract bug.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;
use turngate_core::RejectionCode;
use turngate_core::VerbName;

use crate::types::RejectionCatalogEntry;
use crate::types::VerbContract;
use crate::types::VerbDefinition;

// ============================================================================
// SECTION: Schema Helpers
// ============================================================================

/// A named argument with its JSON Schema fragment.
type Arg = (&'static str, Value);

/// A string-typed argument.
fn string(name: &'static str) -> Arg {
    (name, json!({ "type": "string", "minLength": 1 }))
}

/// An integer-typed argument.
fn integer(name: &'static str) -> Arg {
    (name, json!({ "type": "integer", "minimum": 0 }))
}

/// A string-array-typed argument.
fn string_array(name: &'static str) -> Arg {
    (name, json!({ "type": "array", "items": { "type": "string" } }))
}

/// An open-object-typed argument.
fn object(name: &'static str) -> Arg {
    (name, json!({ "type": "object" }))
}

/// Builds a closed object schema from required and optional arguments.
fn object_schema(required: Vec<Arg>, optional: Vec<Arg>) -> Value {
    let required_names: Vec<&str> = required.iter().map(|(name, _)| *name).collect();
    let mut properties = serde_json::Map::new();
    for (name, schema) in required.into_iter().chain(optional) {
        properties.insert(name.to_owned(), schema);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required_names,
        "additionalProperties": false,
    })
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Rejection codes any plan submission can surface: the validator's full
/// public taxonomy.
fn plan_validation_codes() -> Vec<String> {
    [
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
        RejectionCode::PackInsufficient,
    ]
    .iter()
    .map(|code| code.as_str().to_owned())
    .collect()
}

/// Maps rejection codes to their wire strings.
fn codes(list: &[RejectionCode]) -> Vec<String> {
    list.iter().map(|code| code.as_str().to_owned()).collect()
}

/// Returns the full verb catalog in [`VerbName::ALL`] order.
#[must_use]
pub fn verb_contracts() -> Vec<VerbContract> {
    VerbName::ALL.iter().map(|verb| verb_contract(*verb)).collect()
}

/// Builds the contract for one verb.
#[must_use]
#[allow(clippy::too_many_lines, reason = "One arm per verb; splitting would obscure the catalog.")]
pub fn verb_contract(verb: VerbName) -> VerbContract {
    let (description, when_to_use, input_schema, rejection_codes) = match verb {
        VerbName::InitializeWork => (
            "Opens a session against a prompt and an empty context pack.",
            "Call once, first, before any other verb.",
            object_schema(vec![string("prompt")], vec![string_array("lexemes")]),
            Vec::new(),
        ),
        VerbName::ListAvailableVerbs => (
            "Lists verbs permitted in the current state.",
            "Call whenever unsure what is currently allowed.",
            object_schema(vec![], vec![]),
            Vec::new(),
        ),
        VerbName::GetOriginalPrompt => (
            "Returns the prompt asserted at initialize_work.",
            "Call to recover the original task wording.",
            object_schema(vec![], vec![]),
            Vec::new(),
        ),
        VerbName::ListScopedFiles => (
            "Lists files currently in the session's scope.",
            "Call to see what the allowlist or pack currently covers.",
            object_schema(vec![], vec![]),
            Vec::new(),
        ),
        VerbName::ListDirectoryContents => (
            "Lists directory entries under the worktree root.",
            "Call to explore the repository layout.",
            object_schema(vec![string("targetDir")], vec![]),
            codes(&[RejectionCode::PlanScopeViolation]),
        ),
        VerbName::ReadFileLines => (
            "Reads a line range from a file already in the context pack.",
            "Call after gathering a file via search to inspect it directly.",
            object_schema(
                vec![string("targetFile"), integer("startLine"), integer("endLine")],
                vec![],
            ),
            codes(&[
                RejectionCode::PackScopeViolation,
                RejectionCode::PlanScopeViolation,
                RejectionCode::PlanMissingRequiredFields,
            ]),
        ),
        VerbName::LookupSymbolDefinition => (
            "Searches the index for a symbol's definition.",
            "Call to ground a change in the symbol's actual shape.",
            object_schema(vec![string("symbol")], vec![integer("limit")]),
            codes(&[RejectionCode::PlanVerificationWeak]),
        ),
        VerbName::SearchCodebaseText => (
            "Runs a lexical text search across indexed files.",
            "Call to find candidate files before narrowing with a symbol lookup.",
            object_schema(vec![string("query")], vec![integer("limit")]),
            codes(&[RejectionCode::PlanVerificationWeak]),
        ),
        VerbName::TraceSymbolGraph => (
            "Follows the knowledge graph from a seed to build an evidenced chain.",
            "Call before citing an ag-Grid or federation chain in a plan.",
            object_schema(vec![string("seed")], vec![]),
            codes(&[RejectionCode::PackInsufficient]),
        ),
        VerbName::WriteScratchFile => (
            "Writes a file under the session's scratch prefix.",
            "Call to stage working notes that are not part of the final change.",
            object_schema(vec![string("target"), string("content")], vec![]),
            codes(&[RejectionCode::PlanScopeViolation]),
        ),
        VerbName::FetchJiraTicket => (
            "Fetches an issue-tracker ticket and registers it as evidence.",
            "Call when the prompt references a ticket key not yet in evidence.",
            object_schema(vec![string("issueKey")], vec![]),
            codes(&[RejectionCode::PlanMissingRequiredFields]),
        ),
        VerbName::FetchApiSpec => (
            "Fetches an API specification and registers it as evidence.",
            "Call when the task needs a contract not yet in evidence.",
            object_schema(vec![string("swaggerRef")], vec![]),
            codes(&[RejectionCode::PlanMissingRequiredFields]),
        ),
        VerbName::SubmitExecutionPlan => (
            "Validates a plan graph and, if accepted, unlocks mutation verbs.",
            "Call once enough evidence has been gathered to propose changes.",
            object_schema(vec![object("plan")], vec![]),
            plan_validation_codes(),
        ),
        VerbName::RequestEvidenceGuidance => (
            "Widens the context pack and explains what more is needed.",
            "Call when a plan was rejected for insufficient evidence.",
            object_schema(
                vec![string("need")],
                vec![
                    string_array("blockingReasons"),
                    string_array("newFiles"),
                    string_array("newSymbols"),
                ],
            ),
            codes(&[RejectionCode::PlanMissingRequiredFields, RejectionCode::PackInsufficient]),
        ),
        VerbName::ApplyCodePatch => (
            "Applies a patch for one change node of the accepted plan.",
            "Call once per change node, in dependency order.",
            object_schema(
                vec![string("nodeId"), string("targetFile"), string("patchBody")],
                vec![string_array("targetSymbols")],
            ),
            codes(&[
                RejectionCode::PlanMissingRequiredFields,
                RejectionCode::PackScopeViolation,
                RejectionCode::PlanScopeViolation,
                RejectionCode::PlanPolicyViolation,
            ]),
        ),
        VerbName::RunSandboxedCode => (
            "Runs a validate node's check in a sandbox.",
            "Call once the change nodes it maps to have been applied.",
            object_schema(
                vec![string("nodeId"), string("iife")],
                vec![integer("timeoutMs"), integer("memoryCapMb")],
            ),
            codes(&[
                RejectionCode::PlanMissingRequiredFields,
                RejectionCode::PlanVerificationWeak,
                RejectionCode::PlanScopeViolation,
            ]),
        ),
        VerbName::ExecuteGatedSideEffect => (
            "Executes a side-effect node whose commit gate was approved.",
            "Call only after a human has approved the named commit gate.",
            object_schema(vec![string("nodeId"), string("commitGateId")], vec![]),
            codes(&[
                RejectionCode::PlanMissingRequiredFields,
                RejectionCode::ExecUngatedSideEffect,
                RejectionCode::PlanScopeViolation,
            ]),
        ),
        VerbName::RunAutomationRecipe => (
            "Runs a named, pre-approved automation recipe.",
            "Call for housekeeping tasks outside the plan graph itself.",
            object_schema(vec![string("recipeId")], vec![object("params")]),
            codes(&[RejectionCode::PlanMissingRequiredFields]),
        ),
        VerbName::SignalTaskComplete => (
            "Signals the plan is fully executed and closes the session.",
            "Call only once every plan node has completed.",
            object_schema(vec![string("summary")], vec![]),
            codes(&[RejectionCode::WorkIncomplete]),
        ),
    };
    VerbContract {
        definition: VerbDefinition {
            name: verb,
            description: description.to_owned(),
            when_to_use: when_to_use.to_owned(),
            input_schema,
        },
        rejection_codes,
    }
}

/// Returns the full rejection-code catalog in declaration order.
#[must_use]
pub fn rejection_catalog() -> Vec<RejectionCatalogEntry> {
    RejectionCode::ALL
        .iter()
        .map(|code| RejectionCatalogEntry {
            code: code.as_str().to_owned(),
            remediation: code.remediation().to_owned(),
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
