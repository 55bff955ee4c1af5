// turngate-core/tests/read_verbs.rs
// ============================================================================
// Module: Read Verb Tests
// Description: Pack scope, allowlist scope, and scratch bypass on reads.
// Purpose: Ensure every read is confined to gathered evidence, with the
//          scratch area as the one documented exception.
// Dependencies: turngate-core
// ============================================================================

//! ## Overview
//! After `initialize_work`, any file read must be inside the context pack;
//! scratch paths bypass that check because they are the agent's own
//! workspace, not gathered evidence.

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
use turngate_core::RejectionCode;
use turngate_core::ScopeAllowlist;
use turngate_core::VerbName;

fn read_args(file: &str) -> serde_json::Value {
    json!({ "targetFile": file, "startLine": 1, "endLine": 5 })
}

fn harness_with_file(path: &str, body: &str) -> Harness {
    let mut harness = Harness::new();
    harness.indexer = StubIndexer::with_files(&[(path, body)]);
    harness.initialize("read things");
    harness
}

#[test]
fn a_file_inside_the_pack_reads_its_line_range() {
    let mut harness = harness_with_file("src/factory.ts", "line one\nline two\nline three");
    harness.put_in_pack(&["src/factory.ts"]);
    let envelope = harness.call(VerbName::ReadFileLines, read_args("src/factory.ts"));
    assert!(envelope.deny_reasons.is_empty());
    let lines = envelope.result["lines"].as_array().expect("lines");
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "line one");
}

#[test]
fn a_file_outside_the_pack_is_a_pack_scope_violation() {
    let mut harness = harness_with_file("src/factory.ts", "line one");
    // Indexed but never gathered into the pack.
    let envelope = harness.call(VerbName::ReadFileLines, read_args("src/factory.ts"));
    assert_eq!(envelope.deny_reasons, vec![RejectionCode::PackScopeViolation]);
}

#[test]
fn scratch_paths_bypass_the_pack_scope_check() {
    let mut harness = harness_with_file("scratch/notes.md", "my notes");
    let envelope = harness.call(VerbName::ReadFileLines, read_args("scratch/notes.md"));
    assert!(envelope.deny_reasons.is_empty(), "denied: {:?}", envelope.deny_reasons);
}

#[test]
fn path_escapes_are_scope_violations_before_any_read() {
    let mut harness = harness_with_file("src/factory.ts", "line one");
    harness.put_in_pack(&["src/factory.ts"]);
    for escape in ["../etc/passwd", "/etc/passwd", "src/../../outside.ts"] {
        let envelope = harness.call(VerbName::ReadFileLines, read_args(escape));
        assert_eq!(envelope.deny_reasons, vec![RejectionCode::PlanScopeViolation], "{escape}");
    }
}

#[test]
fn a_narrowed_allowlist_rejects_files_outside_it() {
    let mut harness = harness_with_file("src/factory.ts", "line one");
    harness.put_in_pack(&["src/factory.ts"]);
    harness.session.scope_allowlist = Some(ScopeAllowlist {
        files: vec!["src/other.ts".to_owned()],
        symbols: Vec::new(),
    });
    let envelope = harness.call(VerbName::ReadFileLines, read_args("src/factory.ts"));
    assert_eq!(envelope.deny_reasons, vec![RejectionCode::PlanScopeViolation]);
}

#[test]
fn symbol_lookups_are_filtered_to_pack_covered_files() {
    let mut harness = Harness::new();
    harness.indexer = StubIndexer::with_files(&[
        ("src/factory.ts", "export function widgetFactory() {}"),
        ("src/legacy.ts", "export function widgetFactory() {} // legacy"),
    ]);
    harness.initialize("find the symbol");
    harness.put_in_pack(&["src/factory.ts"]);
    let envelope = harness.call(
        VerbName::LookupSymbolDefinition,
        json!({ "symbol": "widgetFactory" }),
    );
    let matches = envelope.result["matches"].as_array().expect("matches");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["file"], "src/factory.ts");
}

#[test]
fn text_search_is_filtered_to_pack_covered_files() {
    let mut harness = Harness::new();
    harness.indexer = StubIndexer::with_files(&[
        ("src/factory.ts", "the widget colour option"),
        ("src/legacy.ts", "the widget colour option // legacy"),
    ]);
    harness.initialize("find the text");
    harness.put_in_pack(&["src/factory.ts"]);
    let envelope = harness.call(VerbName::SearchCodebaseText, json!({ "query": "colour" }));
    let hits = envelope.result["hits"].as_array().expect("hits");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["file"], "src/factory.ts");
}

#[test]
fn list_scoped_files_prefers_the_allowlist_over_the_pack() {
    let mut harness = harness_with_file("src/factory.ts", "line one");
    harness.put_in_pack(&["src/factory.ts"]);
    harness.session.scope_allowlist = Some(ScopeAllowlist {
        files: vec!["src/allowed.ts".to_owned()],
        symbols: Vec::new(),
    });
    let envelope = harness.call(VerbName::ListScopedFiles, json!({}));
    assert_eq!(envelope.result["files"], json!(["src/allowed.ts"]));
}

#[test]
fn trace_symbol_graph_requires_gathered_evidence_first() {
    let mut harness = Harness::new();
    harness.initialize("trace with an empty pack");
    let envelope = harness.call(VerbName::TraceSymbolGraph, json!({ "seed": "ordersTable" }));
    assert_eq!(envelope.deny_reasons, vec![RejectionCode::PackInsufficient]);

    harness.put_in_pack(&["src/orders.ts"]);
    let envelope = harness.call(VerbName::TraceSymbolGraph, json!({ "seed": "ordersTable" }));
    assert!(envelope.deny_reasons.is_empty());
    assert!(envelope.result["chain"]["links"].is_array());
}
