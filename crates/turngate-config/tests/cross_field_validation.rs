// turngate-config/tests/cross_field_validation.rs
// ============================================================================
// Module: Config Cross-Field Validation Tests
// Description: Range and cross-field checks spanning multiple settings.
// Purpose: Ensure no combination of individually plausible values produces
//          an inconsistent runtime.
// Dependencies: turngate-config
// ============================================================================

//! ## Overview
//! Exercises the validators that relate two or more fields: budget ceilings
//! versus thresholds, promotion windows, and connector and sandbox bounds.

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

use turngate_config::TurngateConfig;

fn rejects(toml: &str) {
    assert!(TurngateConfig::from_bytes(toml.as_bytes()).is_err(), "expected rejection for: {toml}");
}

fn accepts(toml: &str) {
    TurngateConfig::from_bytes(toml.as_bytes()).expect("expected acceptance");
}

#[test]
fn budget_threshold_must_fit_under_the_ceiling() {
    rejects("[budget]\nmax_tokens = 10\nthreshold_tokens = 11\n");
    accepts("[budget]\nmax_tokens = 10\nthreshold_tokens = 10\n");
    rejects("[budget]\nthreshold_tokens = 0\n");
}

#[test]
fn verb_costs_are_capped() {
    rejects("[budget.verb_costs]\napply_code_patch = 1000000\n");
    accepts("[budget.verb_costs]\napply_code_patch = 100\n");
}

#[test]
fn anchor_depth_has_hard_bounds() {
    rejects("[anchors]\nmax_depth = 0\n");
    rejects("[anchors]\nmax_depth = 9\n");
    accepts("[anchors]\nmax_depth = 8\n");
}

#[test]
fn anchor_patterns_must_be_non_empty_strings() {
    rejects("[anchors]\nexclude_patterns = [\"\"]\n");
}

#[test]
fn connector_timeout_has_hard_bounds() {
    rejects("[connector]\nrequest_timeout_ms = 100\n");
    rejects("[connector]\nrequest_timeout_ms = 60000\n");
    accepts("[connector]\nrequest_timeout_ms = 5000\n");
}

#[test]
fn connector_base_url_must_be_http() {
    rejects("[connector]\njira_base_url = \"ftp://jira.example.com\"\n");
    accepts("[connector]\njira_base_url = \"https://jira.example.com\"\n");
}

#[test]
fn sandbox_caps_have_hard_bounds() {
    rejects("[sandbox]\nmemory_cap_mb = 0\n");
    rejects("[sandbox]\nmemory_cap_mb = 999999\n");
    accepts("[sandbox]\nmemory_cap_mb = 512\n");
}

#[test]
fn a_sandbox_interpreter_must_be_a_usable_argv() {
    rejects("[sandbox]\ninterpreter = []\n");
    rejects("[sandbox]\ninterpreter = [\"\"]\n");
    accepts("[sandbox]\ninterpreter = [\"node\", \"-e\"]\n");
}

#[test]
fn evidence_minimum_must_be_at_least_one() {
    rejects("[evidence]\nmin_distinct_sources = 0\n");
    accepts("[evidence]\nmin_distinct_sources = 1\n");
}

#[test]
fn store_busy_timeout_is_capped() {
    rejects("[session_store]\nbusy_timeout_ms = 120000\n");
    accepts("[session_store]\nbusy_timeout_ms = 1000\n");
}
