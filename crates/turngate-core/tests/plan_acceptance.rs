// turngate-core/tests/plan_acceptance.rs
// ============================================================================
// Module: Plan Acceptance Tests
// Description: The happy path from planning to an accepted plan.
// Purpose: Ensure a minimal well-formed plan is accepted and acceptance
//          changes exactly what it should: state, capabilities, progress.
// Dependencies: turngate-core
// ============================================================================

//! ## Overview
//! The minimal valid plan is one change node and one validate node mapping
//! to it, both with non-empty atomicity boundaries.

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

use common::Harness;
use common::minimal_plan;
use common::submit;
use turngate_core::RunState;
use turngate_core::VerbName;

#[test]
fn a_minimal_valid_plan_is_accepted() {
    let mut harness = Harness::new();
    harness.initialize("extend the factory");
    let envelope = submit(&mut harness, &minimal_plan());
    assert!(envelope.deny_reasons.is_empty(), "unexpected denies: {:?}", envelope.deny_reasons);
    assert_eq!(envelope.state, RunState::PlanAccepted);
    assert_eq!(envelope.result["planValidation"], "passed");
}

#[test]
fn acceptance_unlocks_mutation_verbs_and_stamps_a_fingerprint() {
    let mut harness = Harness::new();
    harness.initialize("extend the factory");
    let envelope = submit(&mut harness, &minimal_plan());
    assert!(envelope.capabilities.contains(&VerbName::ApplyCodePatch));
    assert!(envelope.capabilities.contains(&VerbName::ExecuteGatedSideEffect));

    let accepted = harness.session.accepted_plan.as_ref().expect("plan stored");
    let fingerprint = accepted.plan_fingerprint.as_ref().expect("fingerprint stamped");
    let recomputed = accepted
        .compute_fingerprint(turngate_core::hashing::HashAlgorithm::Sha256)
        .expect("recomputes");
    assert_eq!(*fingerprint, recomputed);
}

#[test]
fn acceptance_initializes_plan_progress_bookkeeping() {
    let mut harness = Harness::new();
    harness.initialize("extend the factory");
    submit(&mut harness, &minimal_plan());
    let progress = harness.session.plan_graph_progress.as_ref().expect("progress present");
    assert_eq!(progress.total_nodes, 2);
    assert!(progress.completed_node_ids.is_empty());
}

#[test]
fn a_rejected_plan_leaves_the_session_in_planning() {
    let mut harness = Harness::new();
    harness.initialize("extend the factory");
    let mut broken = minimal_plan();
    broken.nodes.pop();
    let envelope = submit(&mut harness, &broken);
    assert!(!envelope.deny_reasons.is_empty());
    assert_eq!(envelope.state, RunState::Planning);
    assert!(harness.session.accepted_plan.is_none());

    // A corrected resubmission goes through from the same state.
    let envelope = submit(&mut harness, &minimal_plan());
    assert!(envelope.deny_reasons.is_empty());
    assert_eq!(envelope.state, RunState::PlanAccepted);
}

#[test]
fn every_deny_response_names_a_code_and_a_readable_error() {
    let mut harness = Harness::new();
    harness.initialize("extend the factory");
    let mut broken = minimal_plan();
    broken.nodes.pop();
    let envelope = submit(&mut harness, &broken);
    assert!(!envelope.deny_reasons.is_empty());
    let error = envelope.result["error"].as_str().expect("error text");
    assert!(!error.is_empty());
    assert!(envelope.suggested_action.is_some());
}
