// turngate-core/src/runtime/verbs.rs
// ============================================================================
// Module: Verb Handlers
// Description: One function per verb, each returning a result payload, a
//              deny-reason list, and an optional state override.
// Purpose: Keep verb logic separate from dispatch plumbing so each handler
//          reads as a short, linear sequence of checks plus an effect.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! One function per verb, each returning a result payload, a deny-reason list, and an optional state override.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::ArtifactRecord;
use crate::core::ChangeNode;
use crate::core::CommitGateId;
use crate::core::NodeId;
use crate::core::PlanGraphDocument;
use crate::core::PlanGraphProgress;
use crate::core::PlanNodeKind;
use crate::core::RejectionCode;
use crate::core::RunState;
use crate::core::SessionState;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::interfaces::Connector;
use crate::interfaces::Indexer;
use crate::runtime::collision::CollisionGuard;
use crate::runtime::collision::IntendedEffectSet;
use crate::runtime::enforcement::GraphPolicyNode;
use crate::runtime::enforcement::build_enforcement_bundle;
use crate::runtime::evidence_policy;
use crate::runtime::pack_service;
use crate::runtime::scope;
use crate::runtime::validator;

/// The outcome of running a verb handler.
pub struct VerbOutcome {
    /// The verb-specific success payload, or an error payload on deny.
    pub result: Value,
    /// Rejection codes raised while processing this call.
    pub deny_reasons: Vec<RejectionCode>,
    /// A state transition to apply after this call, if any.
    pub state_override: Option<RunState>,
}

impl VerbOutcome {
    fn ok(result: Value) -> Self {
        Self {
            result,
            deny_reasons: Vec::new(),
            state_override: None,
        }
    }

    fn ok_with_transition(result: Value, next_state: RunState) -> Self {
        Self {
            result,
            deny_reasons: Vec::new(),
            state_override: Some(next_state),
        }
    }

    fn denied(code: RejectionCode) -> Self {
        Self {
            result: serde_json::json!({ "error": code.remediation() }),
            deny_reasons: vec![code],
            state_override: None,
        }
    }

    fn denied_many(codes: Vec<RejectionCode>) -> Self {
        let messages: Vec<&str> = codes.iter().map(|c| c.remediation()).collect();
        Self {
            result: serde_json::json!({ "error": messages.join("; ") }),
            deny_reasons: codes,
            state_override: None,
        }
    }
}

fn missing_field(name: &str) -> VerbOutcome {
    let mut outcome = VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    outcome.result = serde_json::json!({ "error": format!("missing required argument `{name}`") });
    outcome
}

/// Arguments for `initialize_work`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeWorkArgs {
    /// The originating task prompt.
    pub prompt: String,
    /// Lexemes extracted from the prompt by the caller.
    #[serde(default)]
    pub lexemes: Vec<String>,
}

/// Validator pass names published in `planGraphSchema`, in the order the
/// validator runs them, so an agent knows exactly which gates a submitted
/// plan will face.
const PLAN_GRAPH_VALIDATORS: [&str; 7] = [
    "envelope",
    "graph",
    "strategy_reasons",
    "node_kinds",
    "evidence_policy",
    "enforcement_rules",
    "migration_citation",
];

/// Seeds the initial pack file list: the scope allowlist wins when one is in
/// force, otherwise the indexer's lexical lanes over the prompt's lexemes.
fn seed_pack_files(session: &SessionState, lexemes: &[String], indexer: &dyn Indexer) -> Vec<String> {
    if let Some(allowlist) = &session.scope_allowlist {
        return allowlist.files.clone();
    }
    let mut files = BTreeSet::new();
    for lexeme in lexemes {
        if let Ok(hits) = indexer.search_lexical(lexeme, 5) {
            files.extend(hits.into_iter().map(|hit| hit.file));
        }
    }
    files.into_iter().collect()
}

/// Runs `initialize_work`: asserts the prompt, builds the initial context
/// pack, derives a knowledge strategy, and transitions the session to
/// `PLANNING`.
pub fn initialize_work(
    session: &mut SessionState,
    args: &InitializeWorkArgs,
    pack_ref: crate::core::PackRef,
    indexer: &dyn Indexer,
    strategy: super::strategy::StrategySelection,
) -> VerbOutcome {
    session.original_prompt = args.prompt.clone();

    let seeded = seed_pack_files(session, &args.lexemes, indexer);
    let mut pack = pack_service::new_pack(pack_ref);
    pack_service::enrich(&mut pack, seeded, std::iter::empty::<String>());
    if strategy.context_signature.mentions_aggrid
        && !pack.files.iter().any(|file| file.to_lowercase().contains("grid"))
    {
        pack.insufficiency = Some(crate::core::PackInsufficiency {
            missing_anchors: vec!["ag-grid-origin-chain".to_owned()],
            reason: "the prompt references an ag-Grid table but no grid evidence was gathered".to_owned(),
        });
    }
    session.context_pack = Some(pack.clone());

    VerbOutcome::ok_with_transition(
        serde_json::json!({
            "contextPack": pack,
            "planGraphSchema": {
                "schemaVersion": super::dispatcher::SCHEMA_VERSION,
                "validators": PLAN_GRAPH_VALIDATORS,
            },
            "strategy": {
                "strategyId": strategy.strategy_id,
                "reasons": strategy.reasons,
                "contextSignature": strategy.context_signature,
            },
            "message": "session initialized",
        }),
        RunState::Planning,
    )
}

/// Runs `list_available_verbs`.
#[must_use]
pub fn list_available_verbs(state: RunState) -> VerbOutcome {
    let verbs = super::capability::allowed_verbs(state);
    VerbOutcome::ok(serde_json::json!({ "available": verbs }))
}

/// Runs `get_original_prompt`.
#[must_use]
pub fn get_original_prompt(session: &SessionState) -> VerbOutcome {
    VerbOutcome::ok(serde_json::json!({ "prompt": session.original_prompt }))
}

/// Runs `list_scoped_files`.
#[must_use]
pub fn list_scoped_files(session: &SessionState) -> VerbOutcome {
    let files: Vec<&String> = match &session.scope_allowlist {
        Some(allowlist) => allowlist.files.iter().collect(),
        None => session
            .context_pack
            .as_ref()
            .map(|pack| pack.files.iter().collect())
            .unwrap_or_default(),
    };
    VerbOutcome::ok(serde_json::json!({ "files": files }))
}

/// Arguments for `list_directory_contents`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDirectoryContentsArgs {
    /// Directory path, relative to the worktree root.
    pub target_dir: String,
}

/// Runs `list_directory_contents`.
pub fn list_directory_contents(
    args: &ListDirectoryContentsArgs,
    worktree_root: &std::path::Path,
    indexer: &dyn Indexer,
) -> VerbOutcome {
    if scope::resolve_within_root(worktree_root, &args.target_dir).is_err() {
        return VerbOutcome::denied(RejectionCode::PlanScopeViolation);
    }
    match indexer.list_directory(&args.target_dir) {
        Ok(entries) => VerbOutcome::ok(serde_json::json!({ "entries": entries })),
        Err(_) => VerbOutcome::denied(RejectionCode::PlanVerificationWeak),
    }
}

/// Arguments for `read_file_lines`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFileLinesArgs {
    /// File path, relative to the worktree root.
    pub target_file: String,
    /// One-based, inclusive start line.
    pub start_line: u32,
    /// One-based, inclusive end line.
    pub end_line: u32,
}

/// Runs `read_file_lines`. Scratch-area paths bypass the pack-scope check,
/// since they are the agent's own workspace rather than gathered evidence.
pub fn read_file_lines(
    session: &SessionState,
    args: &ReadFileLinesArgs,
    worktree_root: &std::path::Path,
    scratch_prefix: &str,
    indexer: &dyn Indexer,
) -> VerbOutcome {
    if scope::resolve_within_root(worktree_root, &args.target_file).is_err() {
        return VerbOutcome::denied(RejectionCode::PlanScopeViolation);
    }
    if !scope::file_in_scope(session.scope_allowlist.as_ref(), &args.target_file) {
        return VerbOutcome::denied(RejectionCode::PlanScopeViolation);
    }
    let in_scratch = args.target_file.starts_with(scratch_prefix);
    if !in_scratch {
        let covered = session
            .context_pack
            .as_ref()
            .is_some_and(|pack| pack.files.contains(&args.target_file));
        if !covered {
            return VerbOutcome::denied(RejectionCode::PackScopeViolation);
        }
    }
    match indexer.read_lines(&args.target_file, args.start_line, args.end_line) {
        Ok(lines) => VerbOutcome::ok(serde_json::json!({ "lines": lines })),
        Err(_) => VerbOutcome::denied(RejectionCode::PlanVerificationWeak),
    }
}

/// Arguments for `lookup_symbol_definition`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupSymbolDefinitionArgs {
    /// The symbol name or fuzzy match query.
    pub symbol: String,
    /// Maximum number of matches to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// Runs `lookup_symbol_definition`, filtering results to those already
/// covered by the session's context pack when one is present.
pub fn lookup_symbol_definition(
    session: &SessionState,
    args: &LookupSymbolDefinitionArgs,
    indexer: &dyn Indexer,
) -> VerbOutcome {
    match indexer.search_symbol(&args.symbol, args.limit) {
        Ok(matches) => {
            let filtered: Vec<_> = match &session.context_pack {
                Some(pack) if !pack.files.is_empty() => {
                    matches.into_iter().filter(|m| pack.files.contains(&m.file)).collect()
                }
                _ => matches,
            };
            VerbOutcome::ok(serde_json::json!({ "matches": filtered }))
        }
        Err(_) => VerbOutcome::denied(RejectionCode::PlanVerificationWeak),
    }
}

/// Arguments for `search_codebase_text`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCodebaseTextArgs {
    /// The lexical search query.
    pub query: String,
    /// Maximum number of hits to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Runs `search_codebase_text`, filtering hits to those already covered by
/// the session's context pack when one is present.
pub fn search_codebase_text(
    session: &SessionState,
    args: &SearchCodebaseTextArgs,
    indexer: &dyn Indexer,
) -> VerbOutcome {
    match indexer.search_lexical(&args.query, args.limit) {
        Ok(hits) => {
            let filtered: Vec<_> = match &session.context_pack {
                Some(pack) if !pack.files.is_empty() => {
                    hits.into_iter().filter(|hit| pack.files.contains(&hit.file)).collect()
                }
                _ => hits,
            };
            VerbOutcome::ok(serde_json::json!({ "hits": filtered }))
        }
        Err(_) => VerbOutcome::denied(RejectionCode::PlanVerificationWeak),
    }
}

/// Arguments for `trace_symbol_graph`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSymbolGraphArgs {
    /// The symbol, file, or query to seed traversal from.
    pub seed: String,
}

/// Runs `trace_symbol_graph`. Requires the session to have at least one
/// domain anchor already attached to its context pack's evidence.
pub fn trace_symbol_graph(
    session: &SessionState,
    args: &TraceSymbolGraphArgs,
    graph: &dyn crate::interfaces::GraphClient,
    indexer: &dyn Indexer,
    few_shot_memories: &[crate::core::MemoryRecord],
) -> VerbOutcome {
    let has_anchor_evidence = session.context_pack.as_ref().is_some_and(|pack| !pack.files.is_empty());
    if !has_anchor_evidence {
        return VerbOutcome::denied(RejectionCode::PackInsufficient);
    }
    let chain = super::proof_chain::build_ag_grid_chain(graph, indexer, &args.seed);
    VerbOutcome::ok(serde_json::json!({
        "chain": chain,
        "fewShotMemories": few_shot_memories,
    }))
}

/// Arguments for `write_scratch_file`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteScratchFileArgs {
    /// Path, relative to the scratch root, to write.
    pub target: String,
    /// File content.
    pub content: String,
}

/// Runs `write_scratch_file`. The write itself is delegated to the caller's
/// filesystem layer; this handler only enforces the scratch-root boundary.
pub fn write_scratch_file(args: &WriteScratchFileArgs, scratch_root: &std::path::Path) -> VerbOutcome {
    match scope::resolve_within_root(scratch_root, &args.target) {
        Ok(resolved) => VerbOutcome::ok(serde_json::json!({
            "path": resolved.display().to_string(),
            "bytesWritten": args.content.len(),
        })),
        Err(code) => VerbOutcome::denied(code),
    }
}

/// Arguments for `fetch_jira_ticket`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchJiraTicketArgs {
    /// The ticket key to fetch.
    pub issue_key: String,
}

/// Runs `fetch_jira_ticket`, recording the fetched artifact on the session.
pub fn fetch_jira_ticket(session: &mut SessionState, args: &FetchJiraTicketArgs, connector: &dyn Connector) -> VerbOutcome {
    if args.issue_key.is_empty() {
        return missing_field("issueKey");
    }
    match connector.fetch_ticket(&args.issue_key) {
        Ok(artifact) => {
            session.artifacts.push(ArtifactRecord {
                id: artifact.id.clone(),
                source: format!("jira:{}", args.issue_key),
                content_ref: artifact.content_ref.clone(),
            });
            if let Some(pack) = session.context_pack.as_mut() {
                pack_service::register_artifact(pack, artifact.id.clone());
            }
            VerbOutcome::ok(serde_json::json!({ "artifact": artifact }))
        }
        Err(err) => VerbOutcome::ok(serde_json::json!({ "error": err.to_string() })),
    }
}

/// Arguments for `fetch_api_spec`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchApiSpecArgs {
    /// URL of the API specification to fetch.
    pub swagger_ref: String,
}

/// Runs `fetch_api_spec`, recording the fetched artifact on the session.
pub fn fetch_api_spec(session: &mut SessionState, args: &FetchApiSpecArgs, connector: &dyn Connector) -> VerbOutcome {
    if args.swagger_ref.is_empty() {
        return missing_field("swaggerRef");
    }
    match connector.fetch_api_spec(&args.swagger_ref) {
        Ok(artifact) => {
            session.artifacts.push(ArtifactRecord {
                id: artifact.id.clone(),
                source: "swagger".to_owned(),
                content_ref: artifact.content_ref.clone(),
            });
            if let Some(pack) = session.context_pack.as_mut() {
                pack_service::register_artifact(pack, artifact.id.clone());
            }
            VerbOutcome::ok(serde_json::json!({ "artifact": artifact }))
        }
        Err(err) => VerbOutcome::ok(serde_json::json!({ "error": err.to_string() })),
    }
}

/// Runs `submit_execution_plan`: validates the plan and, if accepted,
/// transitions the session to `PLAN_ACCEPTED`.
pub fn submit_execution_plan(
    session: &mut SessionState,
    plan: PlanGraphDocument,
    memories: &[crate::core::MemoryRecord],
    graph_policies: &[GraphPolicyNode],
    migration_rules: Vec<crate::core::MigrationRule>,
) -> VerbOutcome {
    let bundle = build_enforcement_bundle(memories, graph_policies, migration_rules);
    let codes = validator::validate(&plan, &bundle);
    if !codes.is_empty() {
        // Validation failure leaves the session in its current planning
        // state; PLAN_REQUIRED has no internal entry transition.
        return VerbOutcome::denied_many(codes);
    }

    let total_nodes = u32::try_from(plan.nodes.len()).unwrap_or(u32::MAX);
    session.plan_graph_progress = Some(PlanGraphProgress {
        total_nodes,
        completed_node_ids: Vec::new(),
        eligible_validate_node_ids: Vec::new(),
    });
    session.enforcement_bundle = Some(bundle);
    let mut accepted = plan;
    if let Ok(fingerprint) = accepted.compute_fingerprint(DEFAULT_HASH_ALGORITHM) {
        accepted.plan_fingerprint = Some(fingerprint);
    }
    session.accepted_plan = Some(accepted);
    VerbOutcome::ok_with_transition(
        serde_json::json!({ "planValidation": "passed" }),
        RunState::PlanAccepted,
    )
}

/// Arguments for `request_evidence_guidance`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEvidenceGuidanceArgs {
    /// What evidence is needed.
    pub need: String,
    /// Why the plan cannot proceed without it.
    #[serde(default)]
    pub blocking_reasons: Vec<String>,
    /// Files newly gathered to satisfy the request.
    #[serde(default)]
    pub new_files: Vec<String>,
    /// Symbols newly gathered to satisfy the request.
    #[serde(default)]
    pub new_symbols: Vec<String>,
}

/// Runs `request_evidence_guidance`, widening the session's pack monotonically.
pub fn request_evidence_guidance(session: &mut SessionState, args: &RequestEvidenceGuidanceArgs) -> VerbOutcome {
    if args.need.is_empty() {
        return missing_field("need");
    }
    let Some(pack) = session.context_pack.as_mut() else {
        return VerbOutcome::denied(RejectionCode::PackInsufficient);
    };
    let delta = pack_service::enrich(pack, args.new_files.clone(), args.new_symbols.clone());
    VerbOutcome::ok(serde_json::json!({
        "packDelta": {
            "addedFiles": delta.added_files,
            "addedSymbols": delta.added_symbols,
            "hashChanged": delta.hash_changed,
            "newHash": pack.hash,
        }
    }))
}

fn find_change_node<'a>(plan: &'a PlanGraphDocument, node_id: &NodeId) -> Option<&'a ChangeNode> {
    plan.node(node_id).and_then(|node| match &node.kind {
        PlanNodeKind::Change(change) => Some(change),
        _ => None,
    })
}

/// Arguments for `apply_code_patch`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCodePatchArgs {
    /// The plan node this patch applies.
    pub node_id: NodeId,
    /// The target file to patch.
    pub target_file: String,
    /// Symbols the patch touches.
    #[serde(default)]
    pub target_symbols: Vec<String>,
    /// The patch body.
    pub patch_body: String,
}

/// Runs `apply_code_patch` in the mandated order: plan lookup, pack scope,
/// allowlist scope, collision reserve, effect, bookkeeping.
pub fn apply_code_patch(
    session: &mut SessionState,
    args: &ApplyCodePatchArgs,
    worktree_root: &std::path::Path,
    collision_guard: &CollisionGuard,
) -> VerbOutcome {
    let Some(plan) = session.accepted_plan.clone() else {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    };
    let Some(change) = find_change_node(&plan, &args.node_id) else {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    };
    if change.target_file != args.target_file {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    }
    if scope::resolve_within_root(worktree_root, &args.target_file).is_err() {
        return VerbOutcome::denied(RejectionCode::PlanScopeViolation);
    }
    let pack_ok = session
        .context_pack
        .as_ref()
        .is_some_and(|pack| pack.files.contains(&args.target_file));
    if !pack_ok {
        return VerbOutcome::denied(RejectionCode::PackScopeViolation);
    }
    if scope::check_change_scope(session.scope_allowlist.as_ref(), &args.target_file, &args.target_symbols).is_err() {
        return VerbOutcome::denied(RejectionCode::PlanScopeViolation);
    }

    let effects = IntendedEffectSet {
        files: std::iter::once(args.target_file.clone()).collect(),
        symbols: args.target_symbols.iter().cloned().collect(),
        ..Default::default()
    };
    let reservation = match collision_guard.assert_and_reserve(
        &session.run_session_id,
        args.node_id.as_str(),
        effects,
        &BTreeSet::new(),
    ) {
        Ok(reservation) => reservation,
        Err(code) => return VerbOutcome::denied(code),
    };

    let artifact_bundle_ref = format!("patch:{}:{}", session.run_session_id, args.node_id);
    mark_node_completed(session, &args.node_id);
    collision_guard.release(&reservation);
    session.state = RunState::ExecutionEnabled;

    VerbOutcome::ok(serde_json::json!({
        "applied": true,
        "artifactBundleRef": artifact_bundle_ref,
        "patchBytes": args.patch_body.len(),
    }))
}

fn mark_node_completed(session: &mut SessionState, node_id: &NodeId) {
    let Some(progress) = session.plan_graph_progress.as_mut() else { return };
    if !progress.completed_node_ids.contains(node_id) {
        progress.completed_node_ids.push(node_id.clone());
    }
    let Some(plan) = session.accepted_plan.as_ref() else { return };
    let newly_eligible: Vec<NodeId> = plan
        .nodes
        .iter()
        .filter_map(|node| match &node.kind {
            PlanNodeKind::Validate(validate) if validate.maps_to_node_ids.contains(node_id) => {
                let all_deps_done = node.depends_on.iter().all(|dep| progress.completed_node_ids.contains(dep));
                all_deps_done.then(|| node.node_id.clone())
            }
            _ => None,
        })
        .collect();
    for eligible in newly_eligible {
        if !progress.eligible_validate_node_ids.contains(&eligible) {
            progress.eligible_validate_node_ids.push(eligible);
        }
    }
}

/// Arguments for `run_sandboxed_code`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSandboxedCodeArgs {
    /// The validate-node this sandbox run satisfies.
    pub node_id: NodeId,
    /// The self-invoking function body to run.
    pub iife: String,
    /// Wall-clock timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Sandbox memory cap in mebibytes.
    #[serde(default)]
    pub memory_cap_mb: Option<u64>,
}

/// Outputs that mean the sandboxed check produced nothing usable; accepting
/// one would let a validate node "pass" without verifying anything.
const PLACEHOLDER_OUTPUTS: [&str; 2] = ["undefined", "null"];

/// Runs `run_sandboxed_code`: plan and collision checks, then execution
/// through the wired sandbox under the caller's caps (or the session's
/// configured defaults). A cap breach or failed run denies with
/// `PLAN_VERIFICATION_WEAK`.
pub fn run_sandboxed_code(
    session: &mut SessionState,
    args: &RunSandboxedCodeArgs,
    collision_guard: &CollisionGuard,
    sandbox: &dyn crate::interfaces::Sandbox,
    default_caps: crate::interfaces::SandboxCaps,
) -> VerbOutcome {
    let Some(plan) = session.accepted_plan.as_ref() else {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    };
    let Some(node) = plan.node(&args.node_id) else {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    };
    if !matches!(node.kind, PlanNodeKind::Validate(_)) {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    }
    if args.iife.trim().is_empty() {
        return missing_field("iife");
    }

    let effects = IntendedEffectSet {
        graph_mutations: std::iter::once(format!("sandbox:{}", args.node_id)).collect(),
        ..Default::default()
    };
    let reservation = match collision_guard.assert_and_reserve(
        &session.run_session_id,
        args.node_id.as_str(),
        effects,
        &BTreeSet::new(),
    ) {
        Ok(reservation) => reservation,
        Err(code) => return VerbOutcome::denied(code),
    };

    let caps = crate::interfaces::SandboxCaps {
        timeout_ms: args.timeout_ms.unwrap_or(default_caps.timeout_ms),
        memory_cap_mb: args.memory_cap_mb.unwrap_or(default_caps.memory_cap_mb),
    };
    let run = match sandbox.execute(&args.iife, &caps) {
        Ok(run) => run,
        Err(err) => {
            collision_guard.release(&reservation);
            let mut outcome = VerbOutcome::denied(RejectionCode::PlanVerificationWeak);
            outcome.result = serde_json::json!({ "error": err.to_string() });
            return outcome;
        }
    };
    let trimmed = run.output.trim();
    if trimmed.is_empty() || PLACEHOLDER_OUTPUTS.contains(&trimmed) {
        collision_guard.release(&reservation);
        let mut outcome = VerbOutcome::denied(RejectionCode::PlanVerificationWeak);
        outcome.result = serde_json::json!({
            "error": format!("sandbox produced placeholder output `{trimmed}`; the check verified nothing"),
        });
        return outcome;
    }

    mark_node_completed(session, &args.node_id);
    collision_guard.release(&reservation);

    VerbOutcome::ok(serde_json::json!({
        "preflight": "accepted",
        "caps": { "timeoutMs": caps.timeout_ms, "memoryCapMb": caps.memory_cap_mb },
        "sandbox": { "output": run.output, "elapsedMs": run.elapsed_ms },
        "artifactBundleRef": format!("sandbox:{}:{}", session.run_session_id, args.node_id),
    }))
}

/// Arguments for `execute_gated_side_effect`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteGatedSideEffectArgs {
    /// The side-effect node to execute.
    pub node_id: NodeId,
    /// The commit gate the caller asserts has been approved.
    pub commit_gate_id: CommitGateId,
}

/// Runs `execute_gated_side_effect`.
pub fn execute_gated_side_effect(
    session: &mut SessionState,
    args: &ExecuteGatedSideEffectArgs,
    collision_guard: &CollisionGuard,
) -> VerbOutcome {
    let Some(plan) = session.accepted_plan.as_ref() else {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    };
    let Some(node) = plan.node(&args.node_id) else {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    };
    let PlanNodeKind::SideEffect(side_effect) = &node.kind else {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    };
    if side_effect.commit_gate_id != args.commit_gate_id {
        let mut outcome = VerbOutcome::denied(RejectionCode::ExecUngatedSideEffect);
        outcome.result = serde_json::json!({
            "error": format!(
                "commit gate `{}` does not match the plan's gate `{}` for node `{}`; obtain approval for the plan's gate",
                args.commit_gate_id, side_effect.commit_gate_id, args.node_id
            ),
        });
        return outcome;
    }

    let mut approved = BTreeSet::new();
    approved.insert(args.commit_gate_id.clone());
    let mut effects = IntendedEffectSet::default();
    effects.external_side_effects.insert(args.commit_gate_id.clone());
    let reservation = match collision_guard.assert_and_reserve(
        &session.run_session_id,
        args.node_id.as_str(),
        effects,
        &approved,
    ) {
        Ok(reservation) => reservation,
        Err(code) => return VerbOutcome::denied(code),
    };
    mark_node_completed(session, &args.node_id);
    collision_guard.release(&reservation);

    VerbOutcome::ok(serde_json::json!({
        "accepted": true,
        "artifactBundleRef": format!("sideeffect:{}:{}", session.run_session_id, args.node_id),
    }))
}

/// Arguments for `run_automation_recipe`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAutomationRecipeArgs {
    /// The recipe identifier to run.
    pub recipe_id: String,
    /// Parameters passed to the recipe.
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,
}

/// Automation recipes this controller knows how to log. Unknown ids are
/// denied rather than silently accepted.
pub const KNOWN_RECIPES: [&str; 2] = ["regenerate_openapi_client", "run_lint_autofix"];

/// Runs `run_automation_recipe`.
pub fn run_automation_recipe(args: &RunAutomationRecipeArgs) -> VerbOutcome {
    if !KNOWN_RECIPES.contains(&args.recipe_id.as_str()) {
        return VerbOutcome::denied(RejectionCode::PlanMissingRequiredFields);
    }
    VerbOutcome::ok(serde_json::json!({
        "recipeId": args.recipe_id,
        "eventLogged": true,
        "params": args.params,
    }))
}

/// Arguments for `signal_task_complete`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalTaskCompleteArgs {
    /// A human-readable summary of the work performed.
    pub summary: String,
}

/// Runs `signal_task_complete`.
pub fn signal_task_complete(session: &mut SessionState, args: &SignalTaskCompleteArgs) -> VerbOutcome {
    let Some(progress) = session.plan_graph_progress.clone() else {
        return VerbOutcome::denied(RejectionCode::WorkIncomplete);
    };
    let completed = progress.completed_node_ids.len() as u32;
    if completed != progress.total_nodes {
        let Some(plan) = session.accepted_plan.as_ref() else {
            return VerbOutcome::denied(RejectionCode::WorkIncomplete);
        };
        let remaining: Vec<&NodeId> = plan
            .nodes
            .iter()
            .map(|node| &node.node_id)
            .filter(|id| !progress.completed_node_ids.contains(id))
            .collect();
        let mut outcome = VerbOutcome::denied(RejectionCode::WorkIncomplete);
        outcome.result = serde_json::json!({
            "error": RejectionCode::WorkIncomplete.remediation(),
            "remainingNodes": remaining,
        });
        return outcome;
    }

    let evidence_gaps: Vec<String> = session.accepted_plan.as_ref().map_or_else(Vec::new, |plan| {
        plan.nodes
            .iter()
            .filter_map(|node| match &node.kind {
                PlanNodeKind::Change(change) => {
                    evidence_policy::evaluate_change_evidence(change, &plan.evidence_policy)
                        .err()
                        .map(|_| change.target_file.clone())
                }
                _ => None,
            })
            .collect()
    });

    VerbOutcome::ok_with_transition(
        serde_json::json!({
            "retrospective": {
                "summary": args.summary,
                "frictionRejections": session.rejection_counts,
                "thinEvidenceFiles": evidence_gaps,
            }
        }),
        RunState::Completed,
    )
}
