// turngate-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: On-disk round-trip, ledger, ingest, and export behavior.
// Purpose: Ensure persisted state survives reopen and the filesystem edges
//          of the memory lifecycle behave as documented.
// Dependencies: turngate-store-sqlite, turngate-core, tempfile
// ============================================================================

//! ## Overview
//! Every test here opens a real database file in a temp directory; the
//! in-memory constructor is covered by the crate's unit tests.

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

use std::fs;
use std::path::Path;

use turngate_core::AgentId;
use turngate_core::AnchorId;
use turngate_core::BudgetStatus;
use turngate_core::DomainAnchor;
use turngate_core::EnforcementType;
use turngate_core::MemoryState;
use turngate_core::RunSessionId;
use turngate_core::SessionState;
use turngate_core::SessionStore;
use turngate_core::WorkId;
use turngate_core::interfaces::MemoryStore;
use turngate_store_sqlite::SqliteStore;
use turngate_store_sqlite::SqliteSyncMode;

fn open(path: &Path) -> SqliteStore {
    SqliteStore::open(path, SqliteSyncMode::Full, 5_000).expect("store opens")
}

fn sample_session(id: &str) -> SessionState {
    SessionState::new(
        RunSessionId::new(id),
        WorkId::new("w1"),
        AgentId::new("a1"),
        BudgetStatus {
            max_tokens: 1_000,
            used_tokens: 0,
            threshold_tokens: 900,
            blocked: false,
        },
    )
}

#[test]
fn a_session_saved_in_one_store_instance_loads_from_a_fresh_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("turngate.sqlite3");
    {
        let store = open(&db);
        store.save(&sample_session("s1")).expect("saves");
    }
    let reopened = open(&db);
    let loaded = reopened.load(&RunSessionId::new("s1")).expect("loads").expect("present");
    assert_eq!(loaded.run_session_id, RunSessionId::new("s1"));
}

#[test]
fn memory_records_and_anchors_round_trip_through_the_trait_surface() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir.path().join("turngate.sqlite3"));

    let record = turngate_core::runtime::memory_service::create_from_friction(
        turngate_core::runtime::memory_service::FrictionInput {
            domain_anchor_ids: vec![AnchorId::new("anchor:src/billing")],
            rejection_codes: vec!["PLAN_SCOPE_VIOLATION".to_owned()],
            origin_strategy_id: None,
            enforcement_type: EnforcementType::PlanRule,
            provenance: "observed twice".to_owned(),
        },
        "2026-01-01T00:00:00Z",
        "t1",
    );
    store.save_memory(&record).expect("saves memory");

    let anchor = DomainAnchor {
        id: AnchorId::new("anchor:src/billing"),
        name: "billing".to_owned(),
        folder_path: "src/billing".to_owned(),
        depth: 2,
        parent_anchor_id: Some(AnchorId::new("anchor:src")),
        auto_seeded: true,
    };
    store.save_anchor(&anchor).expect("saves anchor");

    let memories = store.load_memories().expect("loads memories");
    assert_eq!(memories, vec![record]);
    let anchors = store.load_anchors().expect("loads anchors");
    assert_eq!(anchors, vec![anchor]);
}

#[test]
fn ledgers_are_append_only_and_independent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir.path().join("turngate.sqlite3"));
    store
        .append_friction("2026-01-01T00:00:00Z", &serde_json::json!({"code": "PLAN_NOT_ATOMIC"}))
        .expect("appends friction");
    store
        .append_changelog("2026-01-01T00:00:01Z", &serde_json::json!({"event": "plan_accepted"}))
        .expect("appends changelog");

    assert_eq!(store.read_friction().expect("reads").len(), 1);
    let changelog = store.read_changelog().expect("reads");
    assert_eq!(changelog.len(), 1);
    assert_eq!(changelog[0].entry["event"], "plan_accepted");
}

#[test]
fn override_files_ingest_once_and_are_renamed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir.path().join("turngate.sqlite3"));
    let overrides = dir.path().join("overrides");
    fs::create_dir_all(&overrides).expect("mkdir");

    fs::write(
        overrides.join("require-sec-review.json"),
        serde_json::to_vec(&serde_json::json!({
            "domain_anchor_ids": ["anchor:src/billing"],
            "enforcement_type": "plan_rule",
            "provenance": "security team override",
            "plan_rule": {
                "condition": "src/billing",
                "required_steps": [{"kind": "citation", "target_pattern": "SEC-REVIEW"}]
            }
        }))
        .expect("serializes"),
    )
    .expect("writes override");
    fs::write(overrides.join("broken.json"), b"{not json").expect("writes broken file");

    let ingested = store
        .ingest_override_files(&overrides, MemoryState::Approved, "2026-01-01T00:00:00Z")
        .expect("ingests");
    assert_eq!(ingested.len(), 1);
    assert!(overrides.join("require-sec-review.json.processed").exists());
    assert!(overrides.join("broken.json").exists(), "bad files stay for a human to fix");

    let again = store
        .ingest_override_files(&overrides, MemoryState::Approved, "2026-01-01T00:05:00Z")
        .expect("ingests again");
    assert!(again.is_empty(), "processed files are not re-ingested");

    let memories = store.load_memories().expect("loads");
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].state, MemoryState::Approved);
    assert!(memories[0].plan_rule.is_some());
}

#[test]
fn graph_seed_export_writes_node_and_relationship_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir.path().join("turngate.sqlite3"));

    let anchor = DomainAnchor {
        id: AnchorId::new("anchor:src/billing"),
        name: "billing".to_owned(),
        folder_path: "src/billing".to_owned(),
        depth: 2,
        parent_anchor_id: None,
        auto_seeded: true,
    };
    store.save_anchor(&anchor).expect("saves anchor");

    let mut record = turngate_core::runtime::memory_service::create_from_human_override(
        turngate_core::runtime::memory_service::HumanOverrideInput {
            domain_anchor_ids: vec![AnchorId::new("anchor:src/billing")],
            enforcement_type: EnforcementType::PlanRule,
            initial_state: MemoryState::Approved,
            provenance: "human approved".to_owned(),
        },
        "2026-01-01T00:00:00Z",
        "g1",
    );
    record.plan_rule = Some(turngate_core::PlanRulePayload {
        condition: "src/billing".to_owned(),
        required_steps: Vec::new(),
    });
    store.save_memory(&record).expect("saves memory");

    let seed_dir = dir.path().join("graph-seed");
    let rows = store.write_graph_seed(&seed_dir).expect("exports");
    assert_eq!(rows, 2);

    let body = fs::read_to_string(seed_dir.join("memory/rows.jsonl")).expect("reads rows");
    let parsed: Vec<serde_json::Value> = body
        .lines()
        .map(|line| serde_json::from_str(line).expect("row parses"))
        .collect();
    assert_eq!(parsed[0]["kind"], "node");
    assert_eq!(parsed[1]["kind"], "relationship");
    assert_eq!(parsed[1]["type"], "APPLIES_TO");
}

#[test]
fn a_write_committed_by_an_aborting_process_survives() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("turngate.sqlite3");

    let status = std::process::Command::new(env!("CARGO_BIN_EXE_sqlite_crash_writer"))
        .arg(&db)
        .arg("crash-session")
        .status()
        .expect("crash writer runs");
    assert!(!status.success(), "the writer aborts by design");

    let store = open(&db);
    let loaded = store
        .load(&RunSessionId::new("crash-session"))
        .expect("loads")
        .expect("the committed session survived the abort");
    assert_eq!(loaded.work_id, WorkId::new("crash-work"));
}
