// turngate-core/tests/session_bootstrap.rs
// ============================================================================
// Module: Session Bootstrap Tests
// Description: The first verbs of a session's life.
// Purpose: Ensure initialize_work opens a usable session and the read verbs
//          orient an agent correctly before any plan exists.
// Dependencies: turngate-core
// ============================================================================

//! ## Overview
//! Covers the bootstrap scenario: `initialize_work` against a fresh session,
//! the capability surface it unlocks, and the orientation verbs.

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
use common::StubIndexer;
use serde_json::json;
use turngate_core::RunState;
use turngate_core::VerbName;

#[test]
fn initialize_work_transitions_uninitialized_to_planning() {
    let mut harness = Harness::new();
    assert_eq!(harness.session.state, RunState::Uninitialized);
    let envelope = harness.initialize("Build a widget factory");
    assert_eq!(envelope.state, RunState::Planning);
    assert!(envelope.result["contextPack"]["pack_ref"].is_string());
    let validators = envelope.result["planGraphSchema"]["validators"]
        .as_array()
        .expect("validators published");
    assert!(validators.iter().any(|v| v == "evidence_policy"));
}

#[test]
fn the_initial_pack_is_seeded_from_lexical_lanes() {
    let mut harness = Harness::new();
    harness.indexer = StubIndexer::with_files(&[
        ("src/widgets/factory.ts", "export function widgetFactory() {}"),
        ("src/orders/list.ts", "export const orders = []"),
    ]);
    let envelope = harness.call(
        VerbName::InitializeWork,
        json!({ "prompt": "extend the widget factory", "lexemes": ["widgetFactory"] }),
    );
    let files = envelope.result["contextPack"]["files"].as_array().expect("files");
    assert!(files.iter().any(|f| f == "src/widgets/factory.ts"));
    assert!(!files.iter().any(|f| f == "src/orders/list.ts"));
}

#[test]
fn an_aggrid_prompt_with_no_grid_evidence_reports_pack_insufficiency() {
    let mut harness = Harness::new();
    let envelope = harness.call(
        VerbName::InitializeWork,
        json!({ "prompt": "add a column to the ag-grid orders table" }),
    );
    let insufficiency = &envelope.result["contextPack"]["insufficiency"];
    assert!(insufficiency.is_object(), "expected an insufficiency record");
    let missing = insufficiency["missing_anchors"].as_array().expect("anchors");
    assert!(missing.iter().any(|anchor| anchor == "ag-grid-origin-chain"));
}

#[test]
fn no_verb_but_initialize_work_is_accepted_before_bootstrap() {
    let mut harness = Harness::new();
    let envelope = harness.call(VerbName::GetOriginalPrompt, json!({}));
    assert!(!envelope.deny_reasons.is_empty());
    assert_eq!(harness.session.state, RunState::Uninitialized);
}

#[test]
fn the_original_prompt_is_recoverable_after_bootstrap() {
    let mut harness = Harness::new();
    harness.initialize("Build a widget factory");
    let envelope = harness.call(VerbName::GetOriginalPrompt, json!({}));
    assert_eq!(envelope.result["prompt"], "Build a widget factory");
}

#[test]
fn list_available_verbs_matches_the_envelope_capabilities() {
    let mut harness = Harness::new();
    harness.initialize("orient me");
    let envelope = harness.call(VerbName::ListAvailableVerbs, json!({}));
    let listed: Vec<String> = envelope.result["available"]
        .as_array()
        .expect("available verbs")
        .iter()
        .map(|v| v.as_str().expect("verb string").to_owned())
        .collect();
    let capabilities: Vec<String> =
        envelope.capabilities.iter().map(|verb| verb.as_str().to_owned()).collect();
    assert_eq!(listed, capabilities);
    assert!(listed.contains(&"submit_execution_plan".to_owned()));
    assert!(!listed.contains(&"apply_code_patch".to_owned()));
}

#[test]
fn every_envelope_carries_verb_descriptions_for_its_capabilities() {
    let mut harness = Harness::new();
    let envelope = harness.initialize("describe the surface");
    for capability in &envelope.capabilities {
        let description = envelope
            .verb_descriptions
            .get(capability)
            .unwrap_or_else(|| panic!("no description for {capability}"));
        assert!(!description.description.is_empty());
        assert!(!description.when_to_use.is_empty());
    }
}
