// turngate-core/src/core/session.rs
// ============================================================================
// Module: Session State
// Description: The durable state machine backing one turn-controller session.
// Purpose: Replace ambient global state with an explicit, persistable record
//          threaded through every verb call.
// Dependencies: serde
// ============================================================================

//! The durable state machine backing one turn-controller session.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::ids::AgentId;
use crate::core::ids::NodeId;
use crate::core::ids::RunSessionId;
use crate::core::ids::WorkId;
use crate::core::memory::EnforcementBundle;
use crate::core::pack::ContextPack;
use crate::core::plan::PlanGraphDocument;

/// The lifecycle state of a turn-controller session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// No `initialize_work` call has completed yet.
    Uninitialized,
    /// Read and escalate verbs are available; no plan has been submitted.
    Planning,
    /// The session has been externally marked as needing a plan before
    /// anything else; capability-identical to [`RunState::Planning`].
    PlanRequired,
    /// A plan was validated and accepted; mutation verbs are available.
    PlanAccepted,
    /// At least one mutation verb has run against the accepted plan.
    ExecutionEnabled,
    /// The token budget tripped; all further verbs are denied until released.
    BlockedBudget,
    /// `signal_task_complete` was called and accepted.
    Completed,
    /// The session was terminated without completing its work.
    Failed,
}

/// Tracks token spend against a session's configured budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// The maximum tokens this session may spend.
    pub max_tokens: u64,
    /// Tokens spent so far.
    pub used_tokens: u64,
    /// The used-token level at which the budget gate trips.
    pub threshold_tokens: u64,
    /// Whether the budget gate has currently tripped.
    pub blocked: bool,
}

impl BudgetStatus {
    /// Returns the remaining tokens before the threshold trips.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.threshold_tokens.saturating_sub(self.used_tokens)
    }

    /// Records additional token spend, tripping the gate if it crosses the threshold.
    pub fn record_spend(&mut self, tokens: u64) {
        self.used_tokens = self.used_tokens.saturating_add(tokens);
        if self.used_tokens >= self.threshold_tokens {
            self.blocked = true;
        }
    }
}

/// Tracks progress executing an accepted plan graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanGraphProgress {
    /// Total node count in the accepted plan.
    pub total_nodes: u32,
    /// Node ids whose effect has been applied or verified.
    pub completed_node_ids: Vec<NodeId>,
    /// Validate node ids whose dependencies are all satisfied.
    pub eligible_validate_node_ids: Vec<NodeId>,
}

/// A narrowed set of files and symbols a session is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopeAllowlist {
    /// File paths, relative to the worktree root, that remain in scope.
    pub files: Vec<String>,
    /// Fully qualified symbols that remain in scope.
    pub symbols: Vec<String>,
}

/// A record of an external artifact fetched into the session's evidence surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Identifies this artifact within the session.
    pub id: String,
    /// Where the artifact came from, e.g. `"jira:PROJ-12"` or `"swagger"`.
    pub source: String,
    /// Opaque reference to the artifact's stored content.
    pub content_ref: String,
}

/// The durable state of a single turn-controller session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Identifies this session.
    pub run_session_id: RunSessionId,
    /// The unit of work this session was opened to accomplish.
    pub work_id: WorkId,
    /// The agent that opened this session.
    pub agent_id: AgentId,
    /// Current lifecycle state.
    pub state: RunState,
    /// The original prompt text asserted at `initialize_work`.
    pub original_prompt: String,
    /// Histogram of rejection codes seen so far, keyed by wire string.
    #[serde(default)]
    pub rejection_counts: BTreeMap<String, u32>,
    /// Histogram of verb invocations so far, keyed by verb wire name.
    #[serde(default)]
    pub action_counts: BTreeMap<String, u32>,
    /// Current token budget status.
    pub budget: BudgetStatus,
    /// The plan graph this session has accepted, if any.
    #[serde(default)]
    pub accepted_plan: Option<PlanGraphDocument>,
    /// The scope allowlist in force, if narrowed from the full worktree.
    #[serde(default)]
    pub scope_allowlist: Option<ScopeAllowlist>,
    /// Artifacts fetched into this session's evidence surface.
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
    /// The current context pack, if `initialize_work` has completed.
    #[serde(default)]
    pub context_pack: Option<ContextPack>,
    /// Execution progress against the accepted plan, if any.
    #[serde(default)]
    pub plan_graph_progress: Option<PlanGraphProgress>,
    /// The enforcement bundle built for this session at plan submission time.
    #[serde(default)]
    pub enforcement_bundle: Option<EnforcementBundle>,
}

impl SessionState {
    /// Creates the initial, uninitialized state for a new session.
    #[must_use]
    pub fn new(
        run_session_id: RunSessionId,
        work_id: WorkId,
        agent_id: AgentId,
        budget: BudgetStatus,
    ) -> Self {
        Self {
            run_session_id,
            work_id,
            agent_id,
            state: RunState::Uninitialized,
            original_prompt: String::new(),
            rejection_counts: BTreeMap::new(),
            action_counts: BTreeMap::new(),
            budget,
            accepted_plan: None,
            scope_allowlist: None,
            artifacts: Vec::new(),
            context_pack: None,
            plan_graph_progress: None,
            enforcement_bundle: None,
        }
    }

    /// Records an invocation of `verb` in the action histogram.
    pub fn record_action(&mut self, verb: &str) {
        *self.action_counts.entry(verb.to_owned()).or_insert(0) += 1;
    }

    /// Records an occurrence of `code` in the rejection histogram.
    pub fn record_rejection(&mut self, code: &str) {
        *self.rejection_counts.entry(code.to_owned()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> BudgetStatus {
        BudgetStatus {
            max_tokens: 1000,
            used_tokens: 0,
            threshold_tokens: 900,
            blocked: false,
        }
    }

    #[test]
    fn budget_trips_once_spend_reaches_the_threshold() {
        let mut status = budget();
        status.record_spend(899);
        assert!(!status.blocked);
        status.record_spend(1);
        assert!(status.blocked);
    }

    #[test]
    fn remaining_never_underflows_past_the_threshold() {
        let mut status = budget();
        status.record_spend(10_000);
        assert_eq!(status.remaining(), 0);
    }

    #[test]
    fn action_and_rejection_histograms_accumulate() {
        let mut state = SessionState::new(
            RunSessionId::new("s"),
            WorkId::new("w"),
            AgentId::new("a"),
            budget(),
        );
        state.record_action("read_file_lines");
        state.record_action("read_file_lines");
        state.record_rejection("SCOPE_VIOLATION");
        assert_eq!(state.action_counts["read_file_lines"], 2);
        assert_eq!(state.rejection_counts["SCOPE_VIOLATION"], 1);
    }
}
