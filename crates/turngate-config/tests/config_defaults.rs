// turngate-config/tests/config_defaults.rs
// ============================================================================
// Module: Config Defaults Tests
// Description: Default-value behavior for every configuration section.
// Purpose: Ensure an empty or partial file lands on safe, documented defaults.
// Dependencies: turngate-config
// ============================================================================

//! ## Overview
//! Validates that defaults are internally consistent and that partial files
//! only override the sections they name.

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
use turngate_core::EnforcementType;
use turngate_core::MemoryState;
use turngate_core::VerbName;

#[test]
fn defaults_validate_and_are_internally_consistent() {
    let config = TurngateConfig::default();
    config.validate().expect("defaults validate");
    assert!(config.budget.threshold_tokens <= config.budget.max_tokens);
    assert!(config.memory.expiry_window_secs > config.memory.contest_window_secs);
}

#[test]
fn mutation_verbs_cost_more_than_reads_by_default() {
    let budget = TurngateConfig::default().budget;
    assert!(budget.cost_for(VerbName::ApplyCodePatch) > budget.cost_for(VerbName::ReadFileLines));
    assert!(budget.cost_for(VerbName::SubmitExecutionPlan) > budget.cost_for(VerbName::SearchCodebaseText));
}

#[test]
fn a_partial_file_overrides_only_the_named_section() {
    let toml = b"[budget]\nmax_tokens = 500000\nthreshold_tokens = 450000\n";
    let config = TurngateConfig::from_bytes(toml).expect("partial config parses");
    assert_eq!(config.budget.max_tokens, 500_000);
    assert_eq!(config.paths.work_root, ".turngate/sessions");
    assert_eq!(config.evidence.min_distinct_sources, 2);
}

#[test]
fn memory_defaults_auto_promote_rules_and_signals_only() {
    let memory = TurngateConfig::default().memory;
    assert_eq!(memory.auto_promotable, vec![EnforcementType::PlanRule, EnforcementType::StrategySignal]);
    assert_eq!(memory.override_initial_state, MemoryState::Approved);
}

#[test]
fn enforcement_types_parse_from_their_wire_names() {
    let toml = b"[memory]\nauto_promotable = [\"plan_rule\"]\noverride_initial_state = \"provisional\"\n";
    let config = TurngateConfig::from_bytes(toml).expect("memory section parses");
    assert_eq!(config.memory.auto_promotable, vec![EnforcementType::PlanRule]);
    assert_eq!(config.memory.override_initial_state, MemoryState::Provisional);
}
