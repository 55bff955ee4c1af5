// turngate-core/src/runtime/dispatcher.rs
// ============================================================================
// Module: Turn Controller
// Description: The single entry point every verb call passes through: state
//              gate, budget gate, verb dispatch, envelope assembly.
// Purpose: Give every caller (CLI, future transport) one place that enforces
//          the capability matrix and never lets a handler panic take the
//          session down with it.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! The single entry point every verb call passes through: state gate, budget gate, verb dispatch, envelope assembly.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::AgentId;
use crate::core::PlanGraphDocument;
use crate::core::RejectionCode;
use crate::core::ResponseEnvelope;
use crate::core::RunSessionId;
use crate::core::RunState;
use crate::core::SessionState;
use crate::core::SuggestedAction;
use crate::core::TraceId;
use crate::core::VerbDescription;
use crate::core::VerbName;
use crate::core::WorkId;
use crate::interfaces::Connector;
use crate::interfaces::GraphClient;
use crate::interfaces::Indexer;
use crate::interfaces::MemoryStore;
use crate::interfaces::TurnLogger;
use crate::runtime::capability;
use crate::runtime::collision::CollisionGuard;
use crate::runtime::enforcement::GraphPolicyNode;
use crate::runtime::memory_service;
use crate::runtime::strategy;
use crate::runtime::verbs;
use crate::runtime::verbs::VerbOutcome;

/// Schema version stamped on every envelope this controller emits.
pub const SCHEMA_VERSION: &str = "1";

/// Layout a session's turn controller is configured against.
pub struct SessionLayout {
    /// Absolute path to the worktree root.
    pub worktree_root: std::path::PathBuf,
    /// Path prefix (relative to the worktree root) reserved for scratch writes.
    pub scratch_prefix: String,
    /// Sandbox caps applied when a `run_sandboxed_code` call supplies none.
    pub sandbox_caps: crate::interfaces::SandboxCaps,
}

/// The collaborators a turn controller needs to process a call.
///
/// Held as trait objects so the core crate stays backend-agnostic; a binary
/// wires in concrete implementations.
pub struct Dependencies<'a> {
    /// Source code indexer backing the read verbs.
    pub indexer: &'a dyn Indexer,
    /// Knowledge graph client backing `trace_symbol_graph`.
    pub graph: &'a dyn GraphClient,
    /// External system connector backing the fetch verbs.
    pub connector: &'a dyn Connector,
    /// Bounded executor backing `run_sandboxed_code`.
    pub sandbox: &'a dyn crate::interfaces::Sandbox,
    /// Durable memory store.
    pub memory_store: &'a dyn MemoryStore,
    /// Per-session mutation reservation tracker.
    pub collision_guard: &'a CollisionGuard,
    /// Observability sink.
    pub logger: &'a dyn TurnLogger,
    /// Graph-derived policy nodes active for this plan submission.
    pub graph_policies: &'a [GraphPolicyNode],
}

/// A single verb invocation, as decoded from the wire.
pub struct VerbCall {
    /// The verb being invoked.
    pub verb: VerbName,
    /// Its arguments, still as a JSON value.
    pub args: Value,
    /// Monotonic counter used to derive this call's trace id; callers own
    /// the counter so trace ids stay unique across a session's lifetime.
    pub call_seq: u64,
}

fn verb_description(verb: VerbName) -> VerbDescription {
    let (description, when_to_use, required, optional): (&str, &str, &[&str], &[&str]) = match verb {
        VerbName::InitializeWork => (
            "Opens a session against a prompt and an empty context pack.",
            "Call once, first, before any other verb.",
            &["prompt"],
            &["lexemes"],
        ),
        VerbName::ListAvailableVerbs => (
            "Lists verbs permitted in the current state.",
            "Call whenever unsure what is currently allowed.",
            &[],
            &[],
        ),
        VerbName::GetOriginalPrompt => (
            "Returns the prompt asserted at initialize_work.",
            "Call to recover the original task wording.",
            &[],
            &[],
        ),
        VerbName::ListScopedFiles => (
            "Lists files currently in the session's scope.",
            "Call to see what the allowlist or pack currently covers.",
            &[],
            &[],
        ),
        VerbName::ListDirectoryContents => (
            "Lists directory entries under the worktree root.",
            "Call to explore the repository layout.",
            &["targetDir"],
            &[],
        ),
        VerbName::ReadFileLines => (
            "Reads a line range from a file already in the context pack.",
            "Call after gathering a file via search to inspect it directly.",
            &["targetFile", "startLine", "endLine"],
            &[],
        ),
        VerbName::LookupSymbolDefinition => (
            "Searches the index for a symbol's definition.",
            "Call to ground a change in the symbol's actual shape.",
            &["symbol"],
            &["limit"],
        ),
        VerbName::SearchCodebaseText => (
            "Runs a lexical text search across indexed files.",
            "Call to find candidate files before narrowing with a symbol lookup.",
            &["query"],
            &["limit"],
        ),
        VerbName::TraceSymbolGraph => (
            "Follows the knowledge graph from a seed to build an evidenced chain.",
            "Call before citing an ag-Grid or federation chain in a plan.",
            &["seed"],
            &[],
        ),
        VerbName::WriteScratchFile => (
            "Writes a file under the session's scratch prefix.",
            "Call to stage working notes that are not part of the final change.",
            &["target", "content"],
            &[],
        ),
        VerbName::FetchJiraTicket => (
            "Fetches an issue-tracker ticket and registers it as evidence.",
            "Call when the prompt references a ticket key not yet in evidence.",
            &["issueKey"],
            &[],
        ),
        VerbName::FetchApiSpec => (
            "Fetches an API specification and registers it as evidence.",
            "Call when the task needs a contract not yet in evidence.",
            &["swaggerRef"],
            &[],
        ),
        VerbName::SubmitExecutionPlan => (
            "Validates a plan graph and, if accepted, unlocks mutation verbs.",
            "Call once enough evidence has been gathered to propose changes.",
            &["plan"],
            &[],
        ),
        VerbName::RequestEvidenceGuidance => (
            "Widens the context pack and explains what more is needed.",
            "Call when a plan was rejected for insufficient evidence.",
            &["need"],
            &["blockingReasons", "newFiles", "newSymbols"],
        ),
        VerbName::ApplyCodePatch => (
            "Applies a patch for one change node of the accepted plan.",
            "Call once per change node, in dependency order.",
            &["nodeId", "targetFile", "patchBody"],
            &["targetSymbols"],
        ),
        VerbName::RunSandboxedCode => (
            "Runs a validate node's check in a sandbox.",
            "Call once the change nodes it maps to have been applied.",
            &["nodeId", "iife"],
            &["timeoutMs", "memoryCapMb"],
        ),
        VerbName::ExecuteGatedSideEffect => (
            "Executes a side-effect node whose commit gate was approved.",
            "Call only after a human has approved the named commit gate.",
            &["nodeId", "commitGateId"],
            &[],
        ),
        VerbName::RunAutomationRecipe => (
            "Runs a named, pre-approved automation recipe.",
            "Call for housekeeping tasks outside the plan graph itself.",
            &["recipeId"],
            &["params"],
        ),
        VerbName::SignalTaskComplete => (
            "Signals the plan is fully executed and closes the session.",
            "Call only once every plan node has completed.",
            &["summary"],
            &[],
        ),
    };
    VerbDescription {
        description: description.to_owned(),
        when_to_use: when_to_use.to_owned(),
        required_args: required.iter().map(|s| (*s).to_owned()).collect(),
        optional_args: optional.iter().map(|s| (*s).to_owned()).collect(),
    }
}

fn verb_descriptions_for(state: RunState) -> BTreeMap<VerbName, VerbDescription> {
    capability::allowed_verbs(state)
        .into_iter()
        .map(|verb| (verb, verb_description(verb)))
        .collect()
}

fn suggested_action_for(session: &SessionState) -> Option<SuggestedAction> {
    match session.state {
        RunState::Uninitialized => Some(SuggestedAction {
            verb: VerbName::InitializeWork,
            reason: "no session has been opened yet".to_owned(),
        }),
        RunState::Planning => Some(SuggestedAction {
            verb: VerbName::SubmitExecutionPlan,
            reason: "gather evidence, then submit a plan for validation".to_owned(),
        }),
        RunState::PlanRequired => Some(SuggestedAction {
            verb: VerbName::RequestEvidenceGuidance,
            reason: "the prior plan was rejected; gather more evidence or resubmit".to_owned(),
        }),
        RunState::PlanAccepted | RunState::ExecutionEnabled => session
            .plan_graph_progress
            .as_ref()
            .and_then(|progress| {
                (progress.completed_node_ids.len() as u32 == progress.total_nodes)
                    .then_some(SuggestedAction {
                        verb: VerbName::SignalTaskComplete,
                        reason: "every plan node has completed".to_owned(),
                    })
            })
            .or(Some(SuggestedAction {
                verb: VerbName::ApplyCodePatch,
                reason: "the plan is accepted; apply its change nodes in dependency order".to_owned(),
            })),
        RunState::BlockedBudget => None,
        RunState::Completed | RunState::Failed => None,
    }
}

fn deny_envelope(
    session: &SessionState,
    code: RejectionCode,
    call_seq: u64,
    layout: &SessionLayout,
) -> ResponseEnvelope<Value> {
    build_envelope(
        session,
        serde_json::json!({ "error": code.remediation() }),
        vec![code],
        call_seq,
        layout,
    )
}

fn build_envelope(
    session: &SessionState,
    result: Value,
    deny_reasons: Vec<RejectionCode>,
    call_seq: u64,
    layout: &SessionLayout,
) -> ResponseEnvelope<Value> {
    ResponseEnvelope {
        run_session_id: session.run_session_id.clone(),
        work_id: session.work_id.clone(),
        agent_id: session.agent_id.clone(),
        state: session.state,
        capabilities: capability::allowed_verbs(session.state).into_iter().collect(),
        deny_reasons,
        trace_ref: TraceId::new(format!("{}-{call_seq}", session.run_session_id)),
        schema_version: SCHEMA_VERSION.to_owned(),
        budget_status: session.budget,
        worktree_root: layout.worktree_root.display().to_string(),
        knowledge_strategy: session.accepted_plan.as_ref().map(|plan| plan.knowledge_strategy_id.clone()),
        sub_agent_hints: Vec::new(),
        verb_descriptions: verb_descriptions_for(session.state),
        result,
        suggested_action: suggested_action_for(session),
    }
}

/// Verbs that mutate the worktree or the outside world, permitted only once
/// a plan has been accepted.
fn is_mutation_verb(verb: VerbName) -> bool {
    matches!(
        verb,
        VerbName::ApplyCodePatch
            | VerbName::RunSandboxedCode
            | VerbName::ExecuteGatedSideEffect
            | VerbName::RunAutomationRecipe
    )
}

/// Creates the uninitialized state for a brand-new session.
#[must_use]
pub fn new_session(run_session_id: RunSessionId, work_id: WorkId, agent_id: AgentId, budget: crate::core::BudgetStatus) -> SessionState {
    SessionState::new(run_session_id, work_id, agent_id, budget)
}

/// Processes one verb call end to end: budget gate, state gate, dispatch,
/// bookkeeping, envelope assembly.
///
/// A handler's own failure is never allowed to crash the session; the
/// dispatcher treats a malformed-args or unexpected-state condition the same
/// way a handler's explicit rejection would be treated.
pub fn handle(
    session: &mut SessionState,
    call: VerbCall,
    layout: &SessionLayout,
    deps: &Dependencies<'_>,
) -> ResponseEnvelope<Value> {
    session.record_action(call.verb.as_str());

    if session.budget.blocked && session.state != RunState::Uninitialized {
        session.state = RunState::BlockedBudget;
        session.record_rejection(RejectionCode::BudgetExhausted.as_str());
        deps.logger.verb_denied(&session.run_session_id, call.verb, RejectionCode::BudgetExhausted.as_str());
        return deny_envelope(session, RejectionCode::BudgetExhausted, call.call_seq, layout);
    }

    if !capability::verb_allowed(session.state, call.verb) {
        // A mutation verb before plan acceptance is a scope problem the agent
        // can fix by submitting a plan, not a generic routing error.
        let premature_mutation = is_mutation_verb(call.verb)
            && matches!(session.state, RunState::Planning | RunState::PlanRequired);
        let code = if premature_mutation {
            RejectionCode::PlanScopeViolation
        } else {
            RejectionCode::VerbNotAllowedInState
        };
        session.record_rejection(code.as_str());
        deps.logger.verb_denied(&session.run_session_id, call.verb, code.as_str());
        let mut envelope = deny_envelope(session, code, call.call_seq, layout);
        if premature_mutation {
            envelope.result = serde_json::json!({
                "error": format!(
                    "`{}` mutates the worktree and requires an accepted plan; call submit_execution_plan first",
                    call.verb
                ),
            });
        }
        return envelope;
    }

    let outcome = dispatch(session, call.verb, &call.args, layout, deps);
    apply_outcome(session, call.verb, &outcome, deps);
    build_envelope(session, outcome.result, outcome.deny_reasons, call.call_seq, layout)
}

fn apply_outcome(session: &mut SessionState, verb: VerbName, outcome: &VerbOutcome, deps: &Dependencies<'_>) {
    if outcome.deny_reasons.is_empty() {
        deps.logger.verb_accepted(&session.run_session_id, verb);
    } else {
        for code in &outcome.deny_reasons {
            session.record_rejection(code.as_str());
            deps.logger.verb_denied(&session.run_session_id, verb, code.as_str());
        }
    }
    if let Some(next_state) = outcome.state_override {
        session.state = next_state;
    }
}

fn decode<T: serde::de::DeserializeOwned>(args: &Value) -> Result<T, VerbOutcome> {
    serde_json::from_value(args.clone()).map_err(|err| VerbOutcome {
        result: serde_json::json!({ "error": format!("malformed arguments: {err}") }),
        deny_reasons: vec![RejectionCode::PlanMissingRequiredFields],
        state_override: None,
    })
}

fn dispatch(
    session: &mut SessionState,
    verb: VerbName,
    args: &Value,
    layout: &SessionLayout,
    deps: &Dependencies<'_>,
) -> VerbOutcome {
    match verb {
        VerbName::InitializeWork => match decode::<verbs::InitializeWorkArgs>(args) {
            Ok(parsed) => {
                let memories = memory_service::load_all(deps.memory_store).unwrap_or_default();
                let overrides = crate::runtime::enforcement::active_strategy_overrides(&memories);
                let inputs = strategy::StrategyInputs {
                    prompt: &parsed.prompt,
                    lexemes: &parsed.lexemes,
                    ..Default::default()
                };
                let selection = strategy::select_strategy(&inputs, &overrides);
                let pack_ref = crate::core::PackRef::new(format!("{}-pack", session.run_session_id));
                verbs::initialize_work(session, &parsed, pack_ref, deps.indexer, selection)
            }
            Err(outcome) => outcome,
        },
        VerbName::ListAvailableVerbs => verbs::list_available_verbs(session.state),
        VerbName::GetOriginalPrompt => verbs::get_original_prompt(session),
        VerbName::ListScopedFiles => verbs::list_scoped_files(session),
        VerbName::ListDirectoryContents => match decode::<verbs::ListDirectoryContentsArgs>(args) {
            Ok(parsed) => verbs::list_directory_contents(&parsed, &layout.worktree_root, deps.indexer),
            Err(outcome) => outcome,
        },
        VerbName::ReadFileLines => match decode::<verbs::ReadFileLinesArgs>(args) {
            Ok(parsed) => {
                verbs::read_file_lines(session, &parsed, &layout.worktree_root, &layout.scratch_prefix, deps.indexer)
            }
            Err(outcome) => outcome,
        },
        VerbName::LookupSymbolDefinition => match decode::<verbs::LookupSymbolDefinitionArgs>(args) {
            Ok(parsed) => verbs::lookup_symbol_definition(session, &parsed, deps.indexer),
            Err(outcome) => outcome,
        },
        VerbName::SearchCodebaseText => match decode::<verbs::SearchCodebaseTextArgs>(args) {
            Ok(parsed) => verbs::search_codebase_text(session, &parsed, deps.indexer),
            Err(outcome) => outcome,
        },
        VerbName::TraceSymbolGraph => match decode::<verbs::TraceSymbolGraphArgs>(args) {
            Ok(parsed) => {
                let memories = memory_service::load_all(deps.memory_store).unwrap_or_default();
                let few_shot: Vec<_> = memories
                    .into_iter()
                    .filter(|record| record.enforcement_type == crate::core::EnforcementType::FewShot)
                    .collect();
                verbs::trace_symbol_graph(session, &parsed, deps.graph, deps.indexer, &few_shot)
            }
            Err(outcome) => outcome,
        },
        VerbName::WriteScratchFile => match decode::<verbs::WriteScratchFileArgs>(args) {
            Ok(parsed) => {
                let scratch_root = layout.worktree_root.join(&layout.scratch_prefix);
                verbs::write_scratch_file(&parsed, &scratch_root)
            }
            Err(outcome) => outcome,
        },
        VerbName::FetchJiraTicket => match decode::<verbs::FetchJiraTicketArgs>(args) {
            Ok(parsed) => verbs::fetch_jira_ticket(session, &parsed, deps.connector),
            Err(outcome) => outcome,
        },
        VerbName::FetchApiSpec => match decode::<verbs::FetchApiSpecArgs>(args) {
            Ok(parsed) => verbs::fetch_api_spec(session, &parsed, deps.connector),
            Err(outcome) => outcome,
        },
        VerbName::SubmitExecutionPlan => match decode::<PlanGraphDocument>(args.get("plan").unwrap_or(args)) {
            Ok(plan) => {
                // Sub-agents may collaborate under one session, so an agent id
                // mismatch is logged for the audit trail rather than denied.
                if plan.agent_id != session.agent_id {
                    deps.logger.background_failure(
                        "plan_agent_id_mismatch",
                        &format!("plan from {} submitted under session agent {}", plan.agent_id, session.agent_id),
                    );
                }
                let memories = memory_service::load_all(deps.memory_store).unwrap_or_default();
                verbs::submit_execution_plan(session, plan, &memories, deps.graph_policies, plan_migration_rules(&memories))
            }
            Err(outcome) => outcome,
        },
        VerbName::RequestEvidenceGuidance => match decode::<verbs::RequestEvidenceGuidanceArgs>(args) {
            Ok(parsed) => verbs::request_evidence_guidance(session, &parsed),
            Err(outcome) => outcome,
        },
        VerbName::ApplyCodePatch => match decode::<verbs::ApplyCodePatchArgs>(args) {
            Ok(parsed) => verbs::apply_code_patch(session, &parsed, &layout.worktree_root, deps.collision_guard),
            Err(outcome) => outcome,
        },
        VerbName::RunSandboxedCode => match decode::<verbs::RunSandboxedCodeArgs>(args) {
            Ok(parsed) => verbs::run_sandboxed_code(
                session,
                &parsed,
                deps.collision_guard,
                deps.sandbox,
                layout.sandbox_caps,
            ),
            Err(outcome) => outcome,
        },
        VerbName::ExecuteGatedSideEffect => match decode::<verbs::ExecuteGatedSideEffectArgs>(args) {
            Ok(parsed) => verbs::execute_gated_side_effect(session, &parsed, deps.collision_guard),
            Err(outcome) => outcome,
        },
        VerbName::RunAutomationRecipe => match decode::<verbs::RunAutomationRecipeArgs>(args) {
            Ok(parsed) => verbs::run_automation_recipe(&parsed),
            Err(outcome) => outcome,
        },
        VerbName::SignalTaskComplete => match decode::<verbs::SignalTaskCompleteArgs>(args) {
            Ok(parsed) => verbs::signal_task_complete(session, &parsed),
            Err(outcome) => outcome,
        },
    }
}

fn plan_migration_rules(memories: &[crate::core::MemoryRecord]) -> Vec<crate::core::MigrationRule> {
    memories
        .iter()
        .filter_map(|record| record.strategy_signal.as_ref())
        .flat_map(|signal| signal.feature_overrides.get("migration_rule_from_tag").cloned())
        .map(|from_tag| crate::core::MigrationRule {
            from_tag,
            to_tag: None,
            status: crate::core::MigrationStatus::Unknown,
        })
        .collect()
}

/// Derives and applies a knowledge-gathering strategy selection to the
/// accepted plan's strategy reasons, used by callers that assemble a plan
/// document before calling `submit_execution_plan`.
#[must_use]
pub fn derive_strategy(
    inputs: &strategy::StrategyInputs<'_>,
    memories: &[crate::core::MemoryRecord],
) -> strategy::StrategySelection {
    let overrides = crate::runtime::enforcement::active_strategy_overrides(memories);
    strategy::select_strategy(inputs, &overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AgentId;
    use crate::core::BudgetStatus;
    use crate::core::RunSessionId;
    use crate::core::WorkId;
    use crate::interfaces::Artifact;
    use crate::interfaces::ConnectorError;
    use crate::interfaces::GraphError;
    use crate::interfaces::IndexerError;
    use crate::interfaces::NoopTurnLogger;
    use crate::interfaces::SessionStoreError;
    use crate::interfaces::SymbolMatch;
    use crate::interfaces::TextHit;

    struct EmptyIndexer;
    impl Indexer for EmptyIndexer {
        fn search_symbol(&self, _query: &str, _limit: usize) -> Result<Vec<SymbolMatch>, IndexerError> {
            Ok(Vec::new())
        }
        fn search_lexical(&self, _query: &str, _limit: usize) -> Result<Vec<TextHit>, IndexerError> {
            Ok(Vec::new())
        }
        fn list_indexed_files(&self) -> Result<Vec<String>, IndexerError> {
            Ok(Vec::new())
        }
        fn list_directory(&self, _path: &str) -> Result<Vec<String>, IndexerError> {
            Ok(Vec::new())
        }
        fn read_lines(&self, _file: &str, _start: u32, _end: u32) -> Result<Vec<String>, IndexerError> {
            Ok(Vec::new())
        }
    }

    struct EmptyGraph;
    impl GraphClient for EmptyGraph {
        fn verify_connectivity(&self) -> Result<(), GraphError> {
            Ok(())
        }
        fn run_read(&self, _query: &str, _params: &BTreeMap<String, Value>) -> Result<Vec<Value>, GraphError> {
            Ok(Vec::new())
        }
    }

    struct FailingConnector;
    impl Connector for FailingConnector {
        fn fetch_ticket(&self, key: &str) -> Result<Artifact, ConnectorError> {
            Err(ConnectorError::NotFound(key.to_owned()))
        }
        fn fetch_api_spec(&self, url: &str) -> Result<Artifact, ConnectorError> {
            Err(ConnectorError::NotFound(url.to_owned()))
        }
    }

    struct EmptyMemoryStore;
    impl MemoryStore for EmptyMemoryStore {
        fn load_memories(&self) -> Result<Vec<crate::core::MemoryRecord>, SessionStoreError> {
            Ok(Vec::new())
        }
        fn save_memory(&self, _record: &crate::core::MemoryRecord) -> Result<(), SessionStoreError> {
            Ok(())
        }
        fn load_anchors(&self) -> Result<Vec<crate::core::DomainAnchor>, SessionStoreError> {
            Ok(Vec::new())
        }
        fn save_anchor(&self, _anchor: &crate::core::DomainAnchor) -> Result<(), SessionStoreError> {
            Ok(())
        }
    }

    fn harness() -> (SessionState, SessionLayout, CollisionGuard) {
        let session = new_session(
            RunSessionId::new("s1"),
            WorkId::new("w1"),
            AgentId::new("a1"),
            BudgetStatus {
                max_tokens: 10_000,
                used_tokens: 0,
                threshold_tokens: 9_000,
                blocked: false,
            },
        );
        let layout = SessionLayout {
            worktree_root: std::path::PathBuf::from("/work"),
            scratch_prefix: "scratch".to_owned(),
            sandbox_caps: crate::interfaces::SandboxCaps {
                timeout_ms: 10_000,
                memory_cap_mb: 256,
            },
        };
        (session, layout, CollisionGuard::new())
    }

    fn deps<'a>(collision_guard: &'a CollisionGuard, graph_policies: &'a [GraphPolicyNode]) -> Dependencies<'a> {
        Dependencies {
            indexer: &EmptyIndexer,
            graph: &EmptyGraph,
            connector: &FailingConnector,
            sandbox: &crate::interfaces::PreflightSandbox,
            memory_store: &EmptyMemoryStore,
            collision_guard,
            logger: &NoopTurnLogger,
            graph_policies,
        }
    }

    #[test]
    fn an_uninitialized_session_only_permits_initialize_work() {
        let (mut session, layout, guard) = harness();
        let no_policies: Vec<GraphPolicyNode> = Vec::new();
        let dependencies = deps(&guard, &no_policies);
        let envelope = handle(
            &mut session,
            VerbCall {
                verb: VerbName::ListAvailableVerbs,
                args: serde_json::json!({}),
                call_seq: 1,
            },
            &layout,
            &dependencies,
        );
        assert_eq!(envelope.deny_reasons, vec![RejectionCode::VerbNotAllowedInState]);
    }

    #[test]
    fn initialize_work_transitions_to_planning() {
        let (mut session, layout, guard) = harness();
        let no_policies: Vec<GraphPolicyNode> = Vec::new();
        let dependencies = deps(&guard, &no_policies);
        let envelope = handle(
            &mut session,
            VerbCall {
                verb: VerbName::InitializeWork,
                args: serde_json::json!({ "prompt": "add a field" }),
                call_seq: 1,
            },
            &layout,
            &dependencies,
        );
        assert!(envelope.deny_reasons.is_empty());
        assert_eq!(envelope.state, RunState::Planning);
    }

    #[test]
    fn initialize_work_publishes_the_validator_list_and_a_strategy() {
        let (mut session, layout, guard) = harness();
        let no_policies: Vec<GraphPolicyNode> = Vec::new();
        let dependencies = deps(&guard, &no_policies);
        let envelope = handle(
            &mut session,
            VerbCall {
                verb: VerbName::InitializeWork,
                args: serde_json::json!({ "prompt": "build a widget factory" }),
                call_seq: 1,
            },
            &layout,
            &dependencies,
        );
        let validators = envelope.result["planGraphSchema"]["validators"]
            .as_array()
            .expect("validators array")
            .clone();
        assert!(validators.iter().any(|v| v == "evidence_policy"));
        assert!(envelope.result["strategy"]["strategyId"].is_string());
    }

    #[test]
    fn a_mutation_verb_before_plan_acceptance_is_a_scope_violation() {
        let (mut session, layout, guard) = harness();
        session.state = RunState::Planning;
        let no_policies: Vec<GraphPolicyNode> = Vec::new();
        let dependencies = deps(&guard, &no_policies);
        let envelope = handle(
            &mut session,
            VerbCall {
                verb: VerbName::ApplyCodePatch,
                args: serde_json::json!({}),
                call_seq: 1,
            },
            &layout,
            &dependencies,
        );
        assert_eq!(envelope.deny_reasons, vec![RejectionCode::PlanScopeViolation]);
        let error = envelope.result["error"].as_str().expect("error string");
        assert!(error.contains("submit_execution_plan"));
    }

    #[test]
    fn a_tripped_budget_denies_every_further_call() {
        let (mut session, layout, guard) = harness();
        session.state = RunState::Planning;
        session.budget.used_tokens = session.budget.threshold_tokens;
        session.budget.blocked = true;
        let no_policies: Vec<GraphPolicyNode> = Vec::new();
        let dependencies = deps(&guard, &no_policies);
        let envelope = handle(
            &mut session,
            VerbCall {
                verb: VerbName::GetOriginalPrompt,
                args: serde_json::json!({}),
                call_seq: 1,
            },
            &layout,
            &dependencies,
        );
        assert_eq!(envelope.deny_reasons, vec![RejectionCode::BudgetExhausted]);
        assert_eq!(envelope.state, RunState::BlockedBudget);
    }

    #[test]
    fn malformed_arguments_are_denied_without_panicking() {
        let (mut session, layout, guard) = harness();
        session.state = RunState::Planning;
        let no_policies: Vec<GraphPolicyNode> = Vec::new();
        let dependencies = deps(&guard, &no_policies);
        let envelope = handle(
            &mut session,
            VerbCall {
                verb: VerbName::FetchJiraTicket,
                args: serde_json::json!({ "wrongField": 1 }),
                call_seq: 1,
            },
            &layout,
            &dependencies,
        );
        assert_eq!(envelope.deny_reasons, vec![RejectionCode::PlanMissingRequiredFields]);
    }
}
