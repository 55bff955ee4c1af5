// turngate-core/src/runtime/capability.rs
// ============================================================================
// Module: Capability Matrix
// Description: Maps a session's lifecycle state to the verbs it may invoke.
// Purpose: Centralize the state-to-verb permission table so every entry
//          point (dispatcher, `list_available_verbs`) stays consistent.
// Dependencies: crate::core
// ============================================================================

//! Maps a session's lifecycle state to the verbs it may invoke.

use std::collections::BTreeSet;

use crate::core::RunState;
use crate::core::VerbName;

/// Returns the verbs permitted while a session is in `state`.
///
/// `ExecutionEnabled` carries the same capability set as `PlanAccepted`; it
/// exists to distinguish "plan accepted, nothing executed yet" from "at
/// least one mutation has run" for callers inspecting session history, not
/// because the two states permit a different verb set.
#[must_use]
pub fn allowed_verbs(state: RunState) -> BTreeSet<VerbName> {
    use VerbName::{
        ApplyCodePatch, ExecuteGatedSideEffect, FetchApiSpec, FetchJiraTicket, GetOriginalPrompt,
        InitializeWork, ListAvailableVerbs, ListDirectoryContents, ListScopedFiles,
        LookupSymbolDefinition, ReadFileLines, RequestEvidenceGuidance, RunAutomationRecipe,
        RunSandboxedCode, SearchCodebaseText, SignalTaskComplete, SubmitExecutionPlan,
        TraceSymbolGraph, WriteScratchFile,
    };

    let reads: BTreeSet<VerbName> = [
        ListAvailableVerbs,
        GetOriginalPrompt,
        ListScopedFiles,
        ListDirectoryContents,
        ReadFileLines,
        LookupSymbolDefinition,
        SearchCodebaseText,
        TraceSymbolGraph,
        WriteScratchFile,
        FetchJiraTicket,
        FetchApiSpec,
    ]
    .into_iter()
    .collect();

    match state {
        RunState::Uninitialized => [InitializeWork].into_iter().collect(),
        RunState::Planning | RunState::PlanRequired => {
            let mut verbs = reads;
            verbs.insert(SubmitExecutionPlan);
            verbs.insert(RequestEvidenceGuidance);
            verbs
        }
        RunState::PlanAccepted | RunState::ExecutionEnabled => {
            let mut verbs = reads;
            verbs.insert(RequestEvidenceGuidance);
            verbs.insert(ApplyCodePatch);
            verbs.insert(RunSandboxedCode);
            verbs.insert(ExecuteGatedSideEffect);
            verbs.insert(RunAutomationRecipe);
            verbs.insert(SignalTaskComplete);
            verbs
        }
        RunState::BlockedBudget => [ListAvailableVerbs, GetOriginalPrompt].into_iter().collect(),
        RunState::Completed | RunState::Failed => {
            [ListAvailableVerbs, GetOriginalPrompt].into_iter().collect()
        }
    }
}

/// Returns true if `verb` is permitted while a session is in `state`.
#[must_use]
pub fn verb_allowed(state: RunState, verb: VerbName) -> bool {
    allowed_verbs(state).contains(&verb)
}
