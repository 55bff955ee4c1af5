// turngate-core/src/core/ids.rs
// ============================================================================
// Module: Turngate Identifiers
// Description: Canonical opaque identifiers used throughout a turn session.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Opaque string-backed identifiers used across session, plan, and memory
//! types. Each wraps a `String` and serializes transparently so the wire
//! representation stays a plain JSON string.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Identifies a single turn-controller session end to end.
    RunSessionId
);
string_id!(
    /// Identifies the unit of work a session was opened to accomplish.
    WorkId
);
string_id!(
    /// Identifies the calling agent, asserted at `initialize_work`.
    AgentId
);
string_id!(
    /// Identifies a node inside a plan graph.
    NodeId
);
string_id!(
    /// Identifies a single verb invocation for audit and correlation.
    TraceId
);
string_id!(
    /// Identifies a selected knowledge-gathering strategy.
    StrategyId
);
string_id!(
    /// Opaque reference to a context pack snapshot.
    PackRef
);
string_id!(
    /// Identifies a side-effect commit gate a human approved out of band.
    CommitGateId
);
string_id!(
    /// Identifies a stored memory record.
    MemoryId
);
string_id!(
    /// Identifies a domain anchor folder in the anchor tree.
    AnchorId
);
string_id!(
    /// Identifies a reservation held by the collision guard.
    ReservationId
);

/// The stable set of verbs a session may invoke.
///
/// The wire form is the snake_case verb name; this is the contract surface
/// agents call against, so variants are never renumbered or removed, only
/// added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbName {
    /// Opens a session and asserts identity and the originating prompt.
    InitializeWork,
    /// Lists verbs the session may currently invoke.
    ListAvailableVerbs,
    /// Returns the original prompt the session was opened with.
    GetOriginalPrompt,
    /// Lists files currently inside the context pack or scope allowlist.
    ListScopedFiles,
    /// Lists directory contents beneath the worktree root.
    ListDirectoryContents,
    /// Reads a line range from a scoped file.
    ReadFileLines,
    /// Looks up a symbol definition via the indexer.
    LookupSymbolDefinition,
    /// Runs a lexical search across the indexed codebase.
    SearchCodebaseText,
    /// Traces a symbol's reference graph via the graph client.
    TraceSymbolGraph,
    /// Writes a scratch file inside the session's scratch root.
    WriteScratchFile,
    /// Fetches a ticket from the configured issue tracker connector.
    FetchJiraTicket,
    /// Registers an external API specification as an artifact.
    FetchApiSpec,
    /// Submits a plan graph for validation and acceptance.
    SubmitExecutionPlan,
    /// Requests additional evidence gathering before resubmission.
    RequestEvidenceGuidance,
    /// Applies a code patch described by an accepted change node.
    ApplyCodePatch,
    /// Runs sandboxed code associated with a validate node.
    RunSandboxedCode,
    /// Executes a side effect guarded by a commit gate.
    ExecuteGatedSideEffect,
    /// Runs a named automation recipe.
    RunAutomationRecipe,
    /// Signals that the unit of work is complete.
    SignalTaskComplete,
}

impl VerbName {
    /// All verbs, in the stable order they are documented.
    pub const ALL: [VerbName; 19] = [
        VerbName::InitializeWork,
        VerbName::ListAvailableVerbs,
        VerbName::GetOriginalPrompt,
        VerbName::ListScopedFiles,
        VerbName::ListDirectoryContents,
        VerbName::ReadFileLines,
        VerbName::LookupSymbolDefinition,
        VerbName::SearchCodebaseText,
        VerbName::TraceSymbolGraph,
        VerbName::WriteScratchFile,
        VerbName::FetchJiraTicket,
        VerbName::FetchApiSpec,
        VerbName::SubmitExecutionPlan,
        VerbName::RequestEvidenceGuidance,
        VerbName::ApplyCodePatch,
        VerbName::RunSandboxedCode,
        VerbName::ExecuteGatedSideEffect,
        VerbName::RunAutomationRecipe,
        VerbName::SignalTaskComplete,
    ];

    /// Returns the snake_case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VerbName::InitializeWork => "initialize_work",
            VerbName::ListAvailableVerbs => "list_available_verbs",
            VerbName::GetOriginalPrompt => "get_original_prompt",
            VerbName::ListScopedFiles => "list_scoped_files",
            VerbName::ListDirectoryContents => "list_directory_contents",
            VerbName::ReadFileLines => "read_file_lines",
            VerbName::LookupSymbolDefinition => "lookup_symbol_definition",
            VerbName::SearchCodebaseText => "search_codebase_text",
            VerbName::TraceSymbolGraph => "trace_symbol_graph",
            VerbName::WriteScratchFile => "write_scratch_file",
            VerbName::FetchJiraTicket => "fetch_jira_ticket",
            VerbName::FetchApiSpec => "fetch_api_spec",
            VerbName::SubmitExecutionPlan => "submit_execution_plan",
            VerbName::RequestEvidenceGuidance => "request_evidence_guidance",
            VerbName::ApplyCodePatch => "apply_code_patch",
            VerbName::RunSandboxedCode => "run_sandboxed_code",
            VerbName::ExecuteGatedSideEffect => "execute_gated_side_effect",
            VerbName::RunAutomationRecipe => "run_automation_recipe",
            VerbName::SignalTaskComplete => "signal_task_complete",
        }
    }
}

impl fmt::Display for VerbName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a verb name string does not match a known verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verb name: {0}")]
pub struct UnknownVerbName(pub String);

impl FromStr for VerbName {
    type Err = UnknownVerbName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        VerbName::ALL
            .iter()
            .copied()
            .find(|verb| verb.as_str() == value)
            .ok_or_else(|| UnknownVerbName(value.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_name_round_trips_through_its_wire_string() {
        for verb in VerbName::ALL {
            let parsed: VerbName = verb.as_str().parse().expect("known verb parses");
            assert_eq!(parsed, verb);
        }
    }

    #[test]
    fn unknown_verb_name_is_rejected() {
        assert!("not_a_real_verb".parse::<VerbName>().is_err());
    }

    #[test]
    fn identifier_round_trips_through_json_as_a_plain_string() {
        let id = RunSessionId::new("sess-1");
        let json = serde_json::to_string(&id).expect("serializes");
        assert_eq!(json, "\"sess-1\"");
        let back: RunSessionId = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, id);
    }
}
