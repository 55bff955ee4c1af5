// turngate-core/tests/turn_logging.rs
// ============================================================================
// Module: Turn Logging Tests
// Description: The observability seam the dispatcher reports through.
// Purpose: Ensure accepted and denied verbs are logged, and that the
//          agent-id mismatch on plan submission is a soft log, not a deny.
// Dependencies: turngate-core
// ============================================================================

//! ## Overview
//! Wires a recording logger into the dispatcher and asserts on the exact
//! event stream, since the audit trail is part of the controller's value.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Mutex;

use common::Harness;
use common::NoConnector;
use common::minimal_plan;
use serde_json::json;
use turngate_core::AgentId;
use turngate_core::Dependencies;
use turngate_core::RunSessionId;
use turngate_core::TurnLogger;
use turngate_core::VerbCall;
use turngate_core::VerbName;

/// A logger that records one line per event for assertions.
#[derive(Default)]
struct RecordingTurnLogger {
    events: Mutex<Vec<String>>,
}

impl RecordingTurnLogger {
    fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }
}

impl TurnLogger for RecordingTurnLogger {
    fn verb_denied(&self, _run_session_id: &RunSessionId, verb: VerbName, code: &str) {
        self.events.lock().expect("lock").push(format!("denied {verb} {code}"));
    }

    fn verb_accepted(&self, _run_session_id: &RunSessionId, verb: VerbName) {
        self.events.lock().expect("lock").push(format!("accepted {verb}"));
    }

    fn background_failure(&self, operation: &str, detail: &str) {
        self.events.lock().expect("lock").push(format!("background {operation}: {detail}"));
    }
}

/// Dispatches one call against the harness's stubs with the given logger.
fn call_with_logger(
    harness: &mut Harness,
    logger: &RecordingTurnLogger,
    verb: VerbName,
    args: serde_json::Value,
    call_seq: u64,
) -> turngate_core::ResponseEnvelope<serde_json::Value> {
    let deps = Dependencies {
        indexer: &harness.indexer,
        graph: &harness.graph,
        connector: &NoConnector,
        sandbox: &turngate_core::PreflightSandbox,
        memory_store: &harness.memory_store,
        collision_guard: &harness.collision_guard,
        logger,
        graph_policies: &harness.graph_policies,
    };
    turngate_core::handle(&mut harness.session, VerbCall { verb, args, call_seq }, &harness.layout, &deps)
}

#[test]
fn accepted_and_denied_verbs_both_reach_the_logger() {
    let mut harness = Harness::new();
    let logger = RecordingTurnLogger::default();
    call_with_logger(
        &mut harness,
        &logger,
        VerbName::InitializeWork,
        json!({ "prompt": "log me" }),
        1,
    );
    call_with_logger(&mut harness, &logger, VerbName::ApplyCodePatch, json!({}), 2);

    let events = logger.events();
    assert_eq!(events[0], "accepted initialize_work");
    assert!(events[1].starts_with("denied apply_code_patch"));
}

#[test]
fn an_agent_id_mismatch_on_submission_is_logged_but_not_denied() {
    let mut harness = Harness::new();
    let logger = RecordingTurnLogger::default();
    call_with_logger(
        &mut harness,
        &logger,
        VerbName::InitializeWork,
        json!({ "prompt": "collaborate" }),
        1,
    );

    let mut plan = minimal_plan();
    plan.agent_id = AgentId::new("sub-agent-2");
    let envelope = call_with_logger(
        &mut harness,
        &logger,
        VerbName::SubmitExecutionPlan,
        json!({ "plan": serde_json::to_value(&plan).expect("serializes") }),
        2,
    );
    assert!(envelope.deny_reasons.is_empty(), "mismatch must not deny: {:?}", envelope.deny_reasons);

    let events = logger.events();
    assert!(
        events.iter().any(|event| event.starts_with("background plan_agent_id_mismatch")),
        "missing soft log in {events:?}"
    );
}
