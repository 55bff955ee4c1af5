// turngate-config/src/config.rs
// ============================================================================
// Module: Turngate Configuration
// Description: Configuration loading and validation for the turn controller.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: turngate-core, turngate-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: nothing in this module ever
//! substitutes a permissive default for a value that failed validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use turngate_core::EnforcementType;
use turngate_core::EvidencePolicy;
use turngate_core::MemoryState;
use turngate_core::VerbName;
use turngate_store_sqlite::SqliteSyncMode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "turngate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "TURNGATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum token cost a single verb may be configured to charge.
pub(crate) const MAX_VERB_COST: u64 = 100_000;
/// Maximum session token budget.
pub(crate) const MAX_BUDGET_TOKENS: u64 = 100_000_000;
/// Minimum anchor walk depth.
pub(crate) const MIN_ANCHOR_DEPTH: u32 = 1;
/// Maximum anchor walk depth.
pub(crate) const MAX_ANCHOR_DEPTH: u32 = 8;
/// Maximum number of anchor exclude patterns.
pub(crate) const MAX_ANCHOR_PATTERNS: usize = 256;
/// Minimum memory contest window in seconds.
pub(crate) const MIN_CONTEST_WINDOW_SECS: u64 = 60;
/// Minimum connector request timeout in milliseconds.
pub(crate) const MIN_CONNECTOR_TIMEOUT_MS: u64 = 500;
/// Maximum connector request timeout in milliseconds.
pub(crate) const MAX_CONNECTOR_TIMEOUT_MS: u64 = 30_000;
/// Minimum sandbox wall-clock timeout in milliseconds.
pub(crate) const MIN_SANDBOX_TIMEOUT_MS: u64 = 100;
/// Maximum sandbox wall-clock timeout in milliseconds.
pub(crate) const MAX_SANDBOX_TIMEOUT_MS: u64 = 600_000;
/// Maximum sandbox memory cap in mebibytes.
pub(crate) const MAX_SANDBOX_MEMORY_MB: u64 = 16_384;
/// Maximum indexed file size in bytes.
pub(crate) const MAX_INDEXER_FILE_BYTES: u64 = 64 * 1024 * 1024;
/// Maximum SQLite busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem read failed.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing failed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A value failed a range, shape, or cross-field check.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The config path itself is unusable.
    #[error("invalid config path: {0}")]
    Path(String),
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Top-level turn controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TurngateConfig {
    /// Token budget and per-verb cost configuration.
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Evidence policy defaults applied to submitted plans.
    #[serde(default)]
    pub evidence: EvidenceConfig,
    /// Domain-anchor auto-seeding configuration.
    #[serde(default)]
    pub anchors: AnchorConfig,
    /// Memory promotion and expiry windows.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Persisted-state path layout.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Built-in walking indexer configuration.
    #[serde(default)]
    pub indexer: IndexerConfig,
    /// External connector configuration.
    #[serde(default)]
    pub connector: ConnectorConfig,
    /// Sandbox resource caps for `run_sandboxed_code`.
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// Durable session and memory store configuration.
    #[serde(default)]
    pub session_store: SessionStoreConfig,
}

impl Default for TurngateConfig {
    fn default() -> Self {
        Self {
            budget: BudgetConfig::default(),
            evidence: EvidenceConfig::default(),
            anchors: AnchorConfig::default(),
            memory: MemoryConfig::default(),
            paths: PathsConfig::default(),
            indexer: IndexerConfig::default(),
            connector: ConnectorConfig::default(),
            sandbox: SandboxConfig::default(),
            session_store: SessionStoreConfig::default(),
        }
    }
}

impl TurngateConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// an explicit `path` wins, then the `TURNGATE_CONFIG` environment
    /// variable, then `turngate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_owned()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_owned()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any section is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.budget.validate()?;
        self.evidence.validate()?;
        self.anchors.validate()?;
        self.memory.validate()?;
        self.paths.validate()?;
        self.indexer.validate()?;
        self.connector.validate()?;
        self.sandbox.validate()?;
        self.session_store.validate()?;
        Ok(())
    }
}

/// Token budget configuration: the session ceiling, the gate threshold, and
/// the per-verb cost table the dispatcher charges against it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BudgetConfig {
    /// Maximum tokens a session may spend.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
    /// Used-token level at which the budget gate trips.
    #[serde(default = "default_threshold_tokens")]
    pub threshold_tokens: u64,
    /// Token cost charged per verb, keyed by verb wire name. Verbs absent
    /// from this table charge [`BudgetConfig::default_verb_cost`].
    #[serde(default = "default_verb_costs")]
    pub verb_costs: BTreeMap<String, u64>,
    /// Cost charged for verbs absent from `verb_costs`.
    #[serde(default = "default_verb_cost")]
    pub default_verb_cost: u64,
}

/// Default session token ceiling.
fn default_max_tokens() -> u64 {
    200_000
}

/// Default budget gate threshold.
fn default_threshold_tokens() -> u64 {
    180_000
}

/// Default cost for verbs without an explicit table entry.
fn default_verb_cost() -> u64 {
    1
}

/// Default per-verb cost table: reads are cheap, plan validation and
/// mutations charge more.
fn default_verb_costs() -> BTreeMap<String, u64> {
    let mut costs = BTreeMap::new();
    costs.insert("submit_execution_plan".to_owned(), 10);
    costs.insert("apply_code_patch".to_owned(), 25);
    costs.insert("run_sandboxed_code".to_owned(), 25);
    costs.insert("execute_gated_side_effect".to_owned(), 25);
    costs.insert("run_automation_recipe".to_owned(), 10);
    costs.insert("trace_symbol_graph".to_owned(), 5);
    costs
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            threshold_tokens: default_threshold_tokens(),
            verb_costs: default_verb_costs(),
            default_verb_cost: default_verb_cost(),
        }
    }
}

impl BudgetConfig {
    /// Returns the token cost to charge for `verb`.
    #[must_use]
    pub fn cost_for(&self, verb: VerbName) -> u64 {
        self.verb_costs.get(verb.as_str()).copied().unwrap_or(self.default_verb_cost)
    }

    /// Validates budget bounds and the verb cost table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a bound or verb name is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold_tokens == 0 {
            return Err(ConfigError::Invalid("budget.threshold_tokens must be positive".to_owned()));
        }
        if self.threshold_tokens > self.max_tokens {
            return Err(ConfigError::Invalid(
                "budget.threshold_tokens must not exceed budget.max_tokens".to_owned(),
            ));
        }
        if self.max_tokens > MAX_BUDGET_TOKENS {
            return Err(ConfigError::Invalid("budget.max_tokens exceeds the supported maximum".to_owned()));
        }
        for (name, cost) in &self.verb_costs {
            VerbName::from_str(name).map_err(|_| {
                ConfigError::Invalid(format!("budget.verb_costs names unknown verb `{name}`"))
            })?;
            if *cost > MAX_VERB_COST {
                return Err(ConfigError::Invalid(format!(
                    "budget.verb_costs.{name} exceeds the per-verb cost ceiling"
                )));
            }
        }
        if self.default_verb_cost > MAX_VERB_COST {
            return Err(ConfigError::Invalid(
                "budget.default_verb_cost exceeds the per-verb cost ceiling".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Evidence thresholds applied to submitted plans when the plan itself does
/// not carry stricter ones.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvidenceConfig {
    /// Minimum distinct evidence sources a change node must cite.
    #[serde(default = "default_min_distinct_sources")]
    pub min_distinct_sources: u32,
    /// Whether a single source is acceptable when paired with the full
    /// low-evidence guard trio.
    #[serde(default = "default_true")]
    pub allow_single_source_with_guard: bool,
    /// Minimum requirement-origin sources (tickets, specs), if enforced.
    #[serde(default)]
    pub min_requirement_sources: Option<u32>,
    /// Minimum code-origin sources (symbol defs, lexical hits), if enforced.
    #[serde(default)]
    pub min_code_evidence_sources: Option<u32>,
}

/// Default minimum distinct evidence sources.
fn default_min_distinct_sources() -> u32 {
    2
}

/// Serde default helper for flags that default on.
fn default_true() -> bool {
    true
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            min_distinct_sources: default_min_distinct_sources(),
            allow_single_source_with_guard: true,
            min_requirement_sources: None,
            min_code_evidence_sources: None,
        }
    }
}

impl EvidenceConfig {
    /// Converts this section into the core evidence policy type.
    #[must_use]
    pub fn to_policy(&self) -> EvidencePolicy {
        EvidencePolicy {
            min_distinct_sources: self.min_distinct_sources,
            allow_single_source_with_guard: self.allow_single_source_with_guard,
            min_requirement_sources: self.min_requirement_sources,
            min_code_evidence_sources: self.min_code_evidence_sources,
        }
    }

    /// Validates evidence thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a threshold is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_distinct_sources == 0 {
            return Err(ConfigError::Invalid(
                "evidence.min_distinct_sources must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Domain-anchor auto-seeding configuration: how deep the folder walk goes
/// and which folders it skips or force-includes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnchorConfig {
    /// Maximum folder depth the anchor walk descends to.
    #[serde(default = "default_anchor_depth")]
    pub max_depth: u32,
    /// Folder name patterns excluded from the walk.
    #[serde(default = "default_anchor_excludes")]
    pub exclude_patterns: Vec<String>,
    /// Folder paths always seeded as anchors, even past `max_depth`.
    #[serde(default)]
    pub force_include: Vec<String>,
}

/// Default anchor walk depth.
fn default_anchor_depth() -> u32 {
    3
}

/// Default folder patterns the anchor walk skips.
fn default_anchor_excludes() -> Vec<String> {
    vec![".git".to_owned(), "node_modules".to_owned(), "target".to_owned(), "dist".to_owned()]
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            max_depth: default_anchor_depth(),
            exclude_patterns: default_anchor_excludes(),
            force_include: Vec::new(),
        }
    }
}

impl AnchorConfig {
    /// Validates anchor walk bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a bound or pattern is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ANCHOR_DEPTH..=MAX_ANCHOR_DEPTH).contains(&self.max_depth) {
            return Err(ConfigError::Invalid(format!(
                "anchors.max_depth must be between {MIN_ANCHOR_DEPTH} and {MAX_ANCHOR_DEPTH}"
            )));
        }
        if self.exclude_patterns.len() > MAX_ANCHOR_PATTERNS {
            return Err(ConfigError::Invalid("anchors.exclude_patterns has too many entries".to_owned()));
        }
        for pattern in self.exclude_patterns.iter().chain(self.force_include.iter()) {
            if pattern.is_empty() {
                return Err(ConfigError::Invalid("anchor patterns must be non-empty".to_owned()));
            }
        }
        Ok(())
    }
}

/// Memory promotion and expiry windows.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryConfig {
    /// Seconds a pending record sits in its contest window before
    /// auto-promotion is considered.
    #[serde(default = "default_contest_window")]
    pub contest_window_secs: u64,
    /// Seconds a provisional record remains enforced before expiring absent
    /// human approval.
    #[serde(default = "default_expiry_window")]
    pub expiry_window_secs: u64,
    /// Enforcement types eligible for automatic promotion.
    #[serde(default = "default_auto_promotable")]
    pub auto_promotable: Vec<EnforcementType>,
    /// Initial state given to records ingested from human override files.
    #[serde(default = "default_override_state")]
    pub override_initial_state: MemoryState,
}

/// Default contest window: three days.
fn default_contest_window() -> u64 {
    72 * 3600
}

/// Default expiry window: thirty days.
fn default_expiry_window() -> u64 {
    30 * 24 * 3600
}

/// Default auto-promotable enforcement types.
fn default_auto_promotable() -> Vec<EnforcementType> {
    vec![EnforcementType::PlanRule, EnforcementType::StrategySignal]
}

/// Default initial state for human override records.
fn default_override_state() -> MemoryState {
    MemoryState::Approved
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            contest_window_secs: default_contest_window(),
            expiry_window_secs: default_expiry_window(),
            auto_promotable: default_auto_promotable(),
            override_initial_state: default_override_state(),
        }
    }
}

impl MemoryConfig {
    /// Validates promotion window bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the windows are inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contest_window_secs < MIN_CONTEST_WINDOW_SECS {
            return Err(ConfigError::Invalid("memory.contest_window_secs is too short".to_owned()));
        }
        if self.expiry_window_secs <= self.contest_window_secs {
            return Err(ConfigError::Invalid(
                "memory.expiry_window_secs must exceed memory.contest_window_secs".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Persisted-state path layout, all relative to the process working
/// directory unless stated otherwise.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Root directory for per-session work trees (`scratch/`, `attachments/`).
    #[serde(default = "default_work_root")]
    pub work_root: String,
    /// Directory scanned for human memory-override drop-in files.
    #[serde(default = "default_overrides_dir")]
    pub overrides_dir: String,
    /// Directory graph-seed rows are exported into.
    #[serde(default = "default_graph_seed_dir")]
    pub graph_seed_dir: String,
    /// Directory artifact bundles are written under, one per operation.
    #[serde(default = "default_artifact_bundle_dir")]
    pub artifact_bundle_dir: String,
    /// Path prefix, relative to a session's work root, reserved for scratch
    /// writes that bypass the pack-scope check.
    #[serde(default = "default_scratch_prefix")]
    pub scratch_prefix: String,
}

/// Default session work root.
fn default_work_root() -> String {
    ".turngate/sessions".to_owned()
}

/// Default overrides drop-in directory.
fn default_overrides_dir() -> String {
    ".turngate/overrides".to_owned()
}

/// Default graph-seed export directory.
fn default_graph_seed_dir() -> String {
    ".turngate/graph-seed".to_owned()
}

/// Default artifact bundle directory.
fn default_artifact_bundle_dir() -> String {
    ".turngate/bundles".to_owned()
}

/// Default scratch prefix.
fn default_scratch_prefix() -> String {
    "scratch".to_owned()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_root: default_work_root(),
            overrides_dir: default_overrides_dir(),
            graph_seed_dir: default_graph_seed_dir(),
            artifact_bundle_dir: default_artifact_bundle_dir(),
            scratch_prefix: default_scratch_prefix(),
        }
    }
}

impl PathsConfig {
    /// Validates that every configured path is a safe relative path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a path is absolute, escapes via
    /// `..`, or exceeds length limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("paths.work_root", &self.work_root),
            ("paths.overrides_dir", &self.overrides_dir),
            ("paths.graph_seed_dir", &self.graph_seed_dir),
            ("paths.artifact_bundle_dir", &self.artifact_bundle_dir),
            ("paths.scratch_prefix", &self.scratch_prefix),
        ] {
            validate_relative_path(name, value)?;
        }
        Ok(())
    }
}

/// Built-in walking indexer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerConfig {
    /// Workspace root the indexer walks.
    #[serde(default = "default_indexer_root")]
    pub workspace_root: String,
    /// Path patterns excluded from the walk.
    #[serde(default = "default_anchor_excludes")]
    pub exclude_globs: Vec<String>,
    /// Maximum size, in bytes, of a single file the indexer will snapshot.
    #[serde(default = "default_indexer_file_bytes")]
    pub max_file_bytes: u64,
}

/// Default indexer workspace root.
fn default_indexer_root() -> String {
    ".".to_owned()
}

/// Default maximum indexed file size.
fn default_indexer_file_bytes() -> u64 {
    2 * 1024 * 1024
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_indexer_root(),
            exclude_globs: default_anchor_excludes(),
            max_file_bytes: default_indexer_file_bytes(),
        }
    }
}

impl IndexerConfig {
    /// Validates indexer bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a bound is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace_root.is_empty() {
            return Err(ConfigError::Invalid("indexer.workspace_root must be non-empty".to_owned()));
        }
        if self.max_file_bytes == 0 || self.max_file_bytes > MAX_INDEXER_FILE_BYTES {
            return Err(ConfigError::Invalid("indexer.max_file_bytes is out of range".to_owned()));
        }
        Ok(())
    }
}

/// External connector configuration. The connector is optional: when no base
/// URL is configured the fetch verbs surface a connector-missing error and
/// the session continues.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectorConfig {
    /// Issue tracker base URL, e.g. `https://jira.example.com`.
    #[serde(default)]
    pub jira_base_url: Option<String>,
    /// Independent per-call timeout for connector fetches, in milliseconds.
    #[serde(default = "default_connector_timeout")]
    pub request_timeout_ms: u64,
}

/// Default connector request timeout.
fn default_connector_timeout() -> u64 {
    5_000
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            jira_base_url: None,
            request_timeout_ms: default_connector_timeout(),
        }
    }
}

impl ConnectorConfig {
    /// Validates connector bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the timeout is out of range or
    /// the base URL has an unsupported scheme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CONNECTOR_TIMEOUT_MS..=MAX_CONNECTOR_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "connector.request_timeout_ms must be between {MIN_CONNECTOR_TIMEOUT_MS} and {MAX_CONNECTOR_TIMEOUT_MS}"
            )));
        }
        if let Some(url) = &self.jira_base_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ConfigError::Invalid(
                    "connector.jira_base_url must be an http(s) url".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// Sandbox resource caps and executor for `run_sandboxed_code`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SandboxConfig {
    /// Wall-clock timeout in milliseconds.
    #[serde(default = "default_sandbox_timeout")]
    pub timeout_ms: u64,
    /// Memory cap in mebibytes.
    #[serde(default = "default_sandbox_memory")]
    pub memory_cap_mb: u64,
    /// Interpreter argv the code body is appended to, e.g. `["node", "-e"]`.
    /// Absent means no executor is wired and sandbox verbs run preflight
    /// checks only.
    #[serde(default)]
    pub interpreter: Option<Vec<String>>,
}

/// Default sandbox timeout.
fn default_sandbox_timeout() -> u64 {
    10_000
}

/// Default sandbox memory cap.
fn default_sandbox_memory() -> u64 {
    256
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_sandbox_timeout(),
            memory_cap_mb: default_sandbox_memory(),
            interpreter: None,
        }
    }
}

impl SandboxConfig {
    /// Validates sandbox caps and the interpreter argv.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a cap is out of range or the
    /// interpreter argv is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SANDBOX_TIMEOUT_MS..=MAX_SANDBOX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid("sandbox.timeout_ms is out of range".to_owned()));
        }
        if self.memory_cap_mb == 0 || self.memory_cap_mb > MAX_SANDBOX_MEMORY_MB {
            return Err(ConfigError::Invalid("sandbox.memory_cap_mb is out of range".to_owned()));
        }
        if let Some(interpreter) = &self.interpreter {
            if interpreter.is_empty() || interpreter.iter().any(String::is_empty) {
                return Err(ConfigError::Invalid(
                    "sandbox.interpreter must be a non-empty argv with non-empty components".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// Durable session and memory store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionStoreConfig {
    /// SQLite database file path.
    #[serde(default = "default_store_path")]
    pub path: String,
    /// SQLite synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

/// Default SQLite database path.
fn default_store_path() -> String {
    ".turngate/turngate.sqlite3".to_owned()
}

/// Default SQLite busy timeout.
fn default_busy_timeout() -> u64 {
    5_000
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            sync_mode: SqliteSyncMode::default(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl SessionStoreConfig {
    /// Validates store bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a bound or path is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_relative_path("session_store.path", &self.path)?;
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid("session_store.busy_timeout_ms is out of range".to_owned()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Path Helpers
// ============================================================================

/// Resolves the config path from an explicit argument, the environment, or
/// the default filename, in that order.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(explicit) = path {
        return Ok(explicit.to_path_buf());
    }
    if let Ok(from_env) = env::var(CONFIG_ENV_VAR) {
        if from_env.is_empty() {
            return Err(ConfigError::Path(format!("{CONFIG_ENV_VAR} is set but empty")));
        }
        return Ok(PathBuf::from(from_env));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates length limits on a filesystem path about to be read.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let as_str = path.to_string_lossy();
    if as_str.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Path("config path exceeds total length limit".to_owned()));
    }
    for component in path.components() {
        if let Component::Normal(part) = component {
            if part.to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
                return Err(ConfigError::Path("config path component exceeds length limit".to_owned()));
            }
        }
    }
    Ok(())
}

/// Validates that a configured path is relative, contained, and within
/// length limits.
fn validate_relative_path(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{name} must be non-empty")));
    }
    if value.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{name} exceeds total length limit")));
    }
    let path = Path::new(value);
    if path.is_absolute() {
        return Err(ConfigError::Invalid(format!("{name} must be a relative path")));
    }
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                if part.to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
                    return Err(ConfigError::Invalid(format!("{name} component exceeds length limit")));
                }
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::Invalid(format!("{name} must not escape its root")));
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
