// turngate-core/src/runtime/strategy.rs
// ============================================================================
// Module: Strategy Selector
// Description: Pure derivation of a knowledge-gathering strategy from a
//              context signature built off the inputs gathered so far.
// Purpose: Make strategy choice deterministic and replayable from the same
//          inputs, instead of an ad hoc per-call heuristic.
// Dependencies: crate::core
// ============================================================================

//! Pure derivation of a knowledge-gathering strategy from a context signature built off the inputs gathered so far.

use std::collections::BTreeMap;

use crate::core::StrategyId;
use crate::core::StrategyReason;

/// Confidence in the test coverage already observed for the task at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestConfidenceLevel {
    /// Existing tests thoroughly cover the area.
    High,
    /// Some coverage exists but gaps are likely.
    Medium,
    /// Coverage is thin or stale.
    Low,
    /// No relevant tests were found.
    None,
}

/// A coarse guess at what kind of task this is, based on the gathered signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTypeGuess {
    /// Building or changing a UI feature.
    UiFeature,
    /// Work centered on an API contract.
    ApiContract,
    /// Migrating from a deprecated construct to its replacement.
    Migration,
    /// Diagnosing or fixing a reported failure.
    Debug,
    /// No signal was strong enough to classify the task.
    Unknown,
}

/// The boolean/enum feature vector strategy selection is derived from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContextSignature {
    /// A Swagger/OpenAPI artifact was fetched or referenced.
    pub has_swagger: bool,
    /// The prompt or evidence mentions an ag-Grid table.
    pub mentions_aggrid: bool,
    /// The target area sits behind a module-federation boundary.
    pub behind_federation_boundary: bool,
    /// The target area touches shadow DOM.
    pub touches_shadow_dom: bool,
    /// A deprecated ADP construct is present in the evidence.
    pub migration_adp_present: bool,
    /// An SDF replacement contract is available to migrate to.
    pub sdf_contract_available: bool,
    /// Confidence in existing test coverage for this area.
    pub test_confidence_level: TestConfidenceLevel,
    /// Coarse classification of the task.
    pub task_type_guess: TaskTypeGuess,
    /// Route guards were observed protecting the target area.
    pub has_route_guards: bool,
    /// Template directives (structural, not just interpolation) were observed.
    pub has_template_directives: bool,
}

/// Inputs gathered before a strategy can be derived.
#[derive(Debug, Clone, Default)]
pub struct StrategyInputs<'a> {
    /// The original task prompt.
    pub prompt: &'a str,
    /// Lexemes extracted from the prompt.
    pub lexemes: &'a [String],
    /// Artifact kinds fetched into the session so far.
    pub artifact_kinds: &'a [String],
    /// Field names present on a fetched ticket, if any.
    pub jira_fields: &'a [String],
    /// Symbol names returned by prior symbol search hits.
    pub symbol_hits: &'a [String],
    /// Domain anchor names in the session's anchor set.
    pub anchor_names: &'a [String],
    /// Route-guard identifiers observed in the graph or indexer.
    pub guards: &'a [String],
    /// Template directive names observed in scanned templates.
    pub directives: &'a [String],
}

fn contains_any(haystacks: &[&str], needle: &str) -> bool {
    haystacks.iter().any(|h| h.to_lowercase().contains(needle))
}

fn derive_signature(inputs: &StrategyInputs<'_>) -> ContextSignature {
    let prompt_lower = inputs.prompt.to_lowercase();
    let lexeme_refs: Vec<&str> = inputs.lexemes.iter().map(String::as_str).collect();
    let artifact_refs: Vec<&str> = inputs.artifact_kinds.iter().map(String::as_str).collect();

    let has_swagger = contains_any(&artifact_refs, "api_spec") || contains_any(&artifact_refs, "swagger");
    let mentions_aggrid = prompt_lower.contains("ag-grid") || contains_any(&lexeme_refs, "aggrid");
    let behind_federation_boundary =
        prompt_lower.contains("federation") || contains_any(&lexeme_refs, "remoteentry");
    let touches_shadow_dom = prompt_lower.contains("shadow dom") || contains_any(&lexeme_refs, "shadowroot");
    let migration_adp_present = prompt_lower.contains("adp") || contains_any(&lexeme_refs, "adp");
    let sdf_contract_available = contains_any(&inputs.symbol_hits.iter().map(String::as_str).collect::<Vec<_>>(), "sdf");
    let has_route_guards = !inputs.guards.is_empty();
    let has_template_directives = !inputs.directives.is_empty();

    let test_confidence_level = if contains_any(&lexeme_refs, "coverage_high") {
        TestConfidenceLevel::High
    } else if inputs.symbol_hits.iter().any(|s| s.to_lowercase().contains("test")) {
        TestConfidenceLevel::Medium
    } else if inputs.symbol_hits.is_empty() {
        TestConfidenceLevel::None
    } else {
        TestConfidenceLevel::Low
    };

    let task_type_guess = if migration_adp_present {
        TaskTypeGuess::Migration
    } else if prompt_lower.contains("bug") || prompt_lower.contains("fix") || prompt_lower.contains("error") {
        TaskTypeGuess::Debug
    } else if has_swagger || !inputs.jira_fields.is_empty() && contains_any(&inputs.jira_fields.iter().map(String::as_str).collect::<Vec<_>>(), "api") {
        TaskTypeGuess::ApiContract
    } else if mentions_aggrid || prompt_lower.contains("ui") || prompt_lower.contains("component") {
        TaskTypeGuess::UiFeature
    } else {
        TaskTypeGuess::Unknown
    };

    ContextSignature {
        has_swagger,
        mentions_aggrid,
        behind_federation_boundary,
        touches_shadow_dom,
        migration_adp_present,
        sdf_contract_available,
        test_confidence_level,
        task_type_guess,
        has_route_guards,
        has_template_directives,
    }
}

/// Applies memory-derived feature overrides to a signature before strategy
/// id is re-derived.
pub fn apply_feature_overrides(signature: &mut ContextSignature, overrides: &[BTreeMap<String, String>]) {
    for override_map in overrides {
        if let Some(value) = override_map.get("migration_adp_present") {
            signature.migration_adp_present = value == "true";
        }
        if let Some(value) = override_map.get("mentions_aggrid") {
            signature.mentions_aggrid = value == "true";
        }
        if let Some(value) = override_map.get("task_type_guess") {
            signature.task_type_guess = match value.as_str() {
                "ui_feature" => TaskTypeGuess::UiFeature,
                "api_contract" => TaskTypeGuess::ApiContract,
                "migration" => TaskTypeGuess::Migration,
                "debug" => TaskTypeGuess::Debug,
                _ => TaskTypeGuess::Unknown,
            };
        }
    }
}

/// Derives a strategy id from a context signature via the priority cascade
/// `migration -> debug -> api_contract -> ui_feature -> default`.
#[must_use]
pub fn strategy_id_for(signature: &ContextSignature) -> StrategyId {
    let id = if signature.migration_adp_present || signature.task_type_guess == TaskTypeGuess::Migration {
        "migration_adp_to_sdf"
    } else if signature.task_type_guess == TaskTypeGuess::Debug {
        "debug_first"
    } else if signature.has_swagger || signature.task_type_guess == TaskTypeGuess::ApiContract {
        "api_contract_driven"
    } else if signature.mentions_aggrid || signature.task_type_guess == TaskTypeGuess::UiFeature {
        "ui_feature_driven"
    } else {
        "default"
    };
    StrategyId::new(id)
}

fn reasons_for(signature: &ContextSignature) -> Vec<StrategyReason> {
    let mut reasons = Vec::new();
    if signature.migration_adp_present {
        reasons.push(StrategyReason {
            reason: "prompt or evidence references a deprecated ADP construct".to_owned(),
            evidence_ref: "context_signature:migration_adp_present".to_owned(),
        });
    }
    if signature.has_swagger {
        reasons.push(StrategyReason {
            reason: "a swagger/openapi artifact is available to ground the contract".to_owned(),
            evidence_ref: "context_signature:has_swagger".to_owned(),
        });
    }
    if signature.mentions_aggrid {
        reasons.push(StrategyReason {
            reason: "the task references an ag-Grid table".to_owned(),
            evidence_ref: "context_signature:mentions_aggrid".to_owned(),
        });
    }
    if reasons.is_empty() {
        reasons.push(StrategyReason {
            reason: "no strong signal matched; falling back to the default strategy".to_owned(),
            evidence_ref: "context_signature:default".to_owned(),
        });
    }
    reasons
}

/// The result of running strategy selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategySelection {
    /// The derived strategy id.
    pub strategy_id: StrategyId,
    /// Why each strategy decision was made.
    pub reasons: Vec<StrategyReason>,
    /// The context signature the decision was derived from.
    pub context_signature: ContextSignature,
}

/// Runs the full strategy selection pipeline: derive a signature, fold in
/// memory-derived overrides, then derive a strategy id from the result.
#[must_use]
pub fn select_strategy(
    inputs: &StrategyInputs<'_>,
    feature_overrides: &[BTreeMap<String, String>],
) -> StrategySelection {
    let mut signature = derive_signature(inputs);
    apply_feature_overrides(&mut signature, feature_overrides);
    let strategy_id = strategy_id_for(&signature);
    let reasons = reasons_for(&signature);
    StrategySelection {
        strategy_id,
        reasons,
        context_signature: signature,
    }
}
