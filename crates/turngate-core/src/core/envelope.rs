// turngate-core/src/core/envelope.rs
// ============================================================================
// Module: Response Envelope
// Description: The single response shape every verb call returns.
// Purpose: Keep an agent oriented every turn: current state, capabilities,
//          budget, and a suggested next action, regardless of which verb ran.
// Dependencies: serde
// ============================================================================

//! The response envelope every verb call returns, carrying session state, capabilities, budget, and a suggested next action.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::ids::AgentId;
use crate::core::ids::RunSessionId;
use crate::core::ids::StrategyId;
use crate::core::ids::TraceId;
use crate::core::ids::VerbName;
use crate::core::ids::WorkId;
use crate::core::rejection::RejectionCode;
use crate::core::session::BudgetStatus;
use crate::core::session::RunState;

/// Guidance on how to call a verb, shown so an agent never has to guess a
/// call shape from a schema alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbDescription {
    /// What the verb does.
    pub description: String,
    /// When an agent should reach for this verb.
    pub when_to_use: String,
    /// Argument names that must be supplied.
    pub required_args: Vec<String>,
    /// Argument names that may optionally be supplied.
    pub optional_args: Vec<String>,
}

/// A hint pointing the agent at the verb it should call next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    /// The verb being suggested.
    pub verb: VerbName,
    /// Why this verb is suggested now.
    pub reason: String,
}

/// The response shape returned by every verb call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    /// The session this response belongs to.
    pub run_session_id: RunSessionId,
    /// The unit of work this session addresses.
    pub work_id: WorkId,
    /// The agent that made this call.
    pub agent_id: AgentId,
    /// The session's state after this call was processed.
    pub state: RunState,
    /// Verbs currently available in `state`.
    pub capabilities: Vec<VerbName>,
    /// Rejection codes raised while processing this call, if any.
    pub deny_reasons: Vec<RejectionCode>,
    /// Correlates this response to its audit trace entry.
    pub trace_ref: TraceId,
    /// The envelope schema version.
    pub schema_version: String,
    /// Token budget status after this call.
    pub budget_status: BudgetStatus,
    /// Absolute path to the session's worktree root.
    pub worktree_root: String,
    /// The knowledge-gathering strategy currently selected, if any.
    pub knowledge_strategy: Option<StrategyId>,
    /// Hints for a sub-agent resuming this session's context.
    #[serde(default)]
    pub sub_agent_hints: Vec<String>,
    /// Usage guidance for each currently available verb.
    pub verb_descriptions: BTreeMap<VerbName, VerbDescription>,
    /// The verb-specific result payload.
    pub result: T,
    /// A suggested next verb, if one is evident.
    #[serde(default)]
    pub suggested_action: Option<SuggestedAction>,
}
