// turngate-cli/src/serve.rs
// ============================================================================
// Module: Serve Loop
// Description: Wires config, providers, and the store into the dispatcher
//              and pumps newline-delimited JSON frames through it.
// Purpose: Deliver one call at a time per session, persist after every verb,
//          and keep protocol failures away from session state.
// Dependencies: turngate-core, turngate-config, turngate-providers,
//               turngate-store-sqlite, serde_json
// ============================================================================

//! ## Overview
//! The loop reads one request frame per line, routes it through
//! [`turngate_core::handle`], charges the configured verb cost, persists the
//! session, and writes the envelope as one output line. Because frames are
//! processed strictly in order, the per-session lease the dispatcher assumes
//! is satisfied by construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use turngate_config::TurngateConfig;
use turngate_core::AgentId;
use turngate_core::Artifact;
use turngate_core::BudgetStatus;
use turngate_core::CollisionGuard;
use turngate_core::Connector;
use turngate_core::ConnectorError;
use turngate_core::Dependencies;
use turngate_core::PreflightSandbox;
use turngate_core::RunSessionId;
use turngate_core::Sandbox;
use turngate_core::SandboxCaps;
use turngate_core::SessionStore;
use turngate_core::TurnLogger;
use turngate_core::VerbCall;
use turngate_core::VerbName;
use turngate_core::WorkId;
use turngate_core::runtime::GraphPolicyNode;
use turngate_core::runtime::SessionLayout;
use turngate_providers::HttpConnector;
use turngate_providers::HttpConnectorConfig;
use turngate_providers::InMemoryGraphClient;
use turngate_providers::ProcessSandbox;
use turngate_providers::WalkingIndexer;
use turngate_store_sqlite::SqliteStore;

use crate::protocol;
use crate::protocol::RequestFrame;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that abort the serve loop itself, as opposed to per-frame errors
/// which are answered on stdout and never abort anything.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The runtime could not be wired from configuration.
    #[error("serve wiring error: {0}")]
    Wiring(String),
    /// Reading a frame or writing a response failed at the transport level.
    #[error("serve io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Missing Connector
// ============================================================================

/// Connector used when no issue tracker is configured: every fetch reports
/// the connector as missing, and the verb surfaces that in `result.error`
/// without failing the session.
struct MissingConnector;

impl Connector for MissingConnector {
    fn fetch_ticket(&self, _key: &str) -> Result<Artifact, ConnectorError> {
        Err(ConnectorError::Unavailable("no issue tracker connector is configured".to_owned()))
    }

    fn fetch_api_spec(&self, _url: &str) -> Result<Artifact, ConnectorError> {
        Err(ConnectorError::Unavailable("no issue tracker connector is configured".to_owned()))
    }
}

// ============================================================================
// SECTION: Graph Policy Rows
// ============================================================================

/// One row of `<graph-seed>/policy/rules.jsonl`.
#[derive(Debug, Deserialize)]
struct PolicyRow {
    /// The graph node id the policy came from.
    source: String,
    /// A pattern describing which change nodes the policy applies to.
    condition: String,
    /// Steps required when the condition matches.
    #[serde(default)]
    required_steps: Vec<turngate_core::RequiredStep>,
    /// Whether the policy is linked to a real usage example.
    grounded: bool,
}

/// Loads graph policy rows from the seed directory's `policy/` label, if
/// present. A missing file is an empty policy set, not an error; a malformed
/// file is skipped the same way, logged by the caller.
fn load_graph_policies(seed_dir: &Path) -> Vec<GraphPolicyNode> {
    let path = seed_dir.join("policy/rules.jsonl");
    let Ok(contents) = fs::read_to_string(&path) else { return Vec::new() };
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<PolicyRow>(line).ok())
        .map(|row| GraphPolicyNode {
            source: row.source,
            condition: row.condition,
            required_steps: row.required_steps,
            grounded: row.grounded,
        })
        .collect()
}

// ============================================================================
// SECTION: Runtime
// ============================================================================

/// Everything the serve loop needs, wired once at startup.
pub struct ServeRuntime {
    /// The loaded configuration.
    config: TurngateConfig,
    /// Durable session and memory store.
    store: SqliteStore,
    /// Workspace indexer backing the read verbs.
    indexer: WalkingIndexer,
    /// Knowledge graph backing proof chains.
    graph: InMemoryGraphClient,
    /// Issue tracker connector, when one is configured.
    connector: Option<HttpConnector>,
    /// Bounded executor backing sandbox verbs.
    sandbox: Box<dyn Sandbox>,
    /// Per-session effect reservations.
    collision_guard: CollisionGuard,
    /// Graph-derived policy rules active for plan submissions.
    graph_policies: Vec<GraphPolicyNode>,
    /// Absolute worktree root verbs resolve paths against.
    worktree_root: PathBuf,
}

impl ServeRuntime {
    /// Wires a runtime from configuration and a worktree root.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Wiring`] when the store or indexer cannot be
    /// constructed; the graph and connector degrade to absent instead.
    pub fn from_config(config: TurngateConfig, worktree_root: PathBuf) -> Result<Self, ServeError> {
        let store = SqliteStore::open(
            Path::new(&config.session_store.path),
            config.session_store.sync_mode,
            config.session_store.busy_timeout_ms,
        )
        .map_err(|err| ServeError::Wiring(err.to_string()))?;

        let indexer = WalkingIndexer::new(
            Path::new(&config.indexer.workspace_root),
            config.indexer.exclude_globs.clone(),
        )
        .map_err(|err| ServeError::Wiring(err.to_string()))?;

        let seed_dir = PathBuf::from(&config.paths.graph_seed_dir);
        let edges = seed_dir.join("fact/edges.jsonl");
        let graph = if edges.is_file() {
            InMemoryGraphClient::from_seed_file(&edges)
                .map_err(|err| ServeError::Wiring(err.to_string()))?
        } else {
            InMemoryGraphClient::empty()
        };
        let graph_policies = load_graph_policies(&seed_dir);

        let connector = match &config.connector.jira_base_url {
            Some(base_url) => Some(
                HttpConnector::new(HttpConnectorConfig {
                    jira_base_url: base_url.clone(),
                    allow_http: base_url.starts_with("http://"),
                    timeout_ms: config.connector.request_timeout_ms,
                    ..HttpConnectorConfig::default()
                })
                .map_err(|err| ServeError::Wiring(err.to_string()))?,
            ),
            None => None,
        };

        let sandbox: Box<dyn Sandbox> = match &config.sandbox.interpreter {
            Some(interpreter) => Box::new(
                ProcessSandbox::new(interpreter.clone())
                    .map_err(|err| ServeError::Wiring(err.to_string()))?,
            ),
            None => Box::new(PreflightSandbox),
        };

        Ok(Self {
            config,
            store,
            indexer,
            graph,
            connector,
            sandbox,
            collision_guard: CollisionGuard::new(),
            graph_policies,
            worktree_root,
        })
    }

    /// Builds a runtime over an in-memory store, for tests and dry runs.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Wiring`] when the indexer cannot walk the root.
    pub fn in_memory(config: TurngateConfig, worktree_root: PathBuf) -> Result<Self, ServeError> {
        let store = SqliteStore::in_memory().map_err(|err| ServeError::Wiring(err.to_string()))?;
        let indexer = WalkingIndexer::new(&worktree_root, config.indexer.exclude_globs.clone())
            .map_err(|err| ServeError::Wiring(err.to_string()))?;
        Ok(Self {
            config,
            store,
            indexer,
            graph: InMemoryGraphClient::empty(),
            connector: None,
            sandbox: Box::new(PreflightSandbox),
            collision_guard: CollisionGuard::new(),
            graph_policies: Vec::new(),
            worktree_root,
        })
    }

    /// Returns the durable store, for maintenance commands.
    #[must_use]
    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Returns the loaded configuration.
    #[must_use]
    pub fn config(&self) -> &TurngateConfig {
        &self.config
    }

    /// The fresh budget a new session starts with.
    fn initial_budget(&self) -> BudgetStatus {
        BudgetStatus {
            max_tokens: self.config.budget.max_tokens,
            used_tokens: 0,
            threshold_tokens: self.config.budget.threshold_tokens,
            blocked: false,
        }
    }
}

// ============================================================================
// SECTION: Loop
// ============================================================================

/// Performs the scratch write a successful `write_scratch_file` outcome
/// described; the handler validates the path, the binary owns the I/O.
fn apply_scratch_write(_runtime: &ServeRuntime, args: &Value, envelope_result: &Value) {
    let Some(path) = envelope_result.get("path").and_then(Value::as_str) else { return };
    let Some(content) = args.get("content").and_then(Value::as_str) else { return };
    let target = Path::new(path);
    if let Some(parent) = target.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = fs::write(target, content);
}

/// Writes the artifact bundle a successful mutation outcome names: one
/// directory per operation holding `result.json`, `opLog.txt`,
/// `diffSummary.json`, and `validation.json`.
///
/// Bundle writes are audit material, not gating: a failure is reported to
/// the logger and the verb's success stands.
fn write_artifact_bundle(
    runtime: &ServeRuntime,
    verb: VerbName,
    args: &Value,
    envelope: &turngate_core::ResponseEnvelope<Value>,
    logger: &dyn TurnLogger,
) {
    let Some(bundle_ref) = envelope.result.get("artifactBundleRef").and_then(Value::as_str) else {
        return;
    };
    let dir_name: String = bundle_ref
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let bundle_dir = runtime
        .worktree_root
        .join(&runtime.config.paths.artifact_bundle_dir)
        .join(dir_name);

    let op_log = format!(
        "verb={verb} session={} trace={}\n",
        envelope.run_session_id, envelope.trace_ref
    );
    let diff_summary = serde_json::json!({
        "targetFile": args.get("targetFile").cloned().unwrap_or(Value::Null),
        "targetSymbols": args.get("targetSymbols").cloned().unwrap_or(Value::Null),
        "nodeId": args.get("nodeId").cloned().unwrap_or(Value::Null),
    });
    let validation = serde_json::json!({ "denyReasons": envelope.deny_reasons });

    let result = fs::create_dir_all(&bundle_dir)
        .and_then(|()| fs::write(bundle_dir.join("result.json"), render(&envelope.result)))
        .and_then(|()| fs::write(bundle_dir.join("opLog.txt"), op_log))
        .and_then(|()| fs::write(bundle_dir.join("diffSummary.json"), render(&diff_summary)))
        .and_then(|()| fs::write(bundle_dir.join("validation.json"), render(&validation)));
    if let Err(err) = result {
        logger.background_failure("artifact_bundle_write", &err.to_string());
    }
}

/// Renders a JSON value as pretty bytes with a trailing newline.
fn render(value: &Value) -> Vec<u8> {
    let mut bytes = serde_json::to_vec_pretty(value).unwrap_or_default();
    bytes.push(b'\n');
    bytes
}

/// Appends one friction-ledger row for a denied verb. Non-fatal: a ledger
/// failure is logged and the response still goes out.
fn append_friction(
    runtime: &ServeRuntime,
    verb: VerbName,
    envelope: &turngate_core::ResponseEnvelope<Value>,
    logger: &dyn TurnLogger,
) {
    let now = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let entry = serde_json::json!({
        "runSessionId": envelope.run_session_id,
        "verb": verb.as_str(),
        "codes": envelope.deny_reasons,
    });
    if let Err(err) = runtime.store.append_friction(&now, &entry) {
        logger.background_failure("friction_ledger_append", &err.to_string());
    }
}

/// Pumps frames from `reader` through the dispatcher until end of input.
///
/// Per-frame failures are answered on `writer` and never abort the loop;
/// only transport-level I/O failures do.
///
/// # Errors
///
/// Returns [`ServeError::Io`] when reading a line or writing a response
/// fails.
pub fn run_loop(
    reader: impl BufRead,
    mut writer: impl Write,
    runtime: &ServeRuntime,
    logger: &dyn TurnLogger,
) -> Result<(), ServeError> {
    let mut call_seqs: BTreeMap<String, u64> = BTreeMap::new();

    for line in reader.lines() {
        let line = line.map_err(|err| ServeError::Io(err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }

        let frame = match RequestFrame::decode(&line) {
            Ok(frame) => frame,
            Err(detail) => {
                write_value(&mut writer, &protocol::protocol_error(protocol::INVALID_REQUEST, &detail))?;
                continue;
            }
        };
        let Ok(verb) = VerbName::from_str(&frame.verb) else {
            write_value(
                &mut writer,
                &protocol::protocol_error(
                    protocol::METHOD_NOT_FOUND,
                    &format!("unknown verb `{}`", frame.verb),
                ),
            )?;
            continue;
        };

        let session_id = RunSessionId::new(frame.run_session_id.clone());
        let mut session = match load_or_new(runtime, &session_id, &frame) {
            Ok(session) => session,
            Err(detail) => {
                write_value(&mut writer, &protocol::protocol_error(protocol::INVALID_REQUEST, &detail))?;
                continue;
            }
        };

        let seq = call_seqs.entry(frame.run_session_id.clone()).or_insert(0);
        *seq += 1;

        let layout = SessionLayout {
            worktree_root: runtime.worktree_root.clone(),
            scratch_prefix: runtime.config.paths.scratch_prefix.clone(),
            sandbox_caps: SandboxCaps {
                timeout_ms: runtime.config.sandbox.timeout_ms,
                memory_cap_mb: runtime.config.sandbox.memory_cap_mb,
            },
        };
        let deps = Dependencies {
            indexer: &runtime.indexer,
            graph: &runtime.graph,
            connector: runtime
                .connector
                .as_ref()
                .map_or(&MissingConnector as &dyn Connector, |connector| connector as &dyn Connector),
            sandbox: runtime.sandbox.as_ref(),
            memory_store: &runtime.store,
            collision_guard: &runtime.collision_guard,
            logger,
            graph_policies: &runtime.graph_policies,
        };

        let args = frame.args.clone();
        let envelope = turngate_core::handle(
            &mut session,
            VerbCall { verb, args: frame.args, call_seq: *seq },
            &layout,
            &deps,
        );

        if envelope.deny_reasons.is_empty() {
            match verb {
                VerbName::WriteScratchFile => apply_scratch_write(runtime, &args, &envelope.result),
                VerbName::ApplyCodePatch
                | VerbName::RunSandboxedCode
                | VerbName::ExecuteGatedSideEffect => {
                    write_artifact_bundle(runtime, verb, &args, &envelope, logger);
                }
                _ => {}
            }
        }

        if !envelope.deny_reasons.is_empty() {
            append_friction(runtime, verb, &envelope, logger);
        }

        session.budget.record_spend(runtime.config.budget.cost_for(verb));
        if let Err(err) = runtime.store.save(&session) {
            logger.background_failure("session_save", &err.to_string());
        }

        let rendered = serde_json::to_value(&envelope)
            .unwrap_or_else(|err| protocol::protocol_error(protocol::INVALID_REQUEST, &err.to_string()));
        write_value(&mut writer, &rendered)?;
    }
    Ok(())
}

/// Loads the addressed session or creates it on first reference.
fn load_or_new(
    runtime: &ServeRuntime,
    session_id: &RunSessionId,
    frame: &RequestFrame,
) -> Result<turngate_core::SessionState, String> {
    match runtime.store.load(session_id) {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Ok(turngate_core::new_session(
            session_id.clone(),
            WorkId::new(frame.work_id.clone()),
            AgentId::new(frame.agent_id.clone()),
            runtime.initial_budget(),
        )),
        Err(err) => Err(err.to_string()),
    }
}

/// Writes one JSON value as a single output line.
fn write_value(writer: &mut impl Write, value: &Value) -> Result<(), ServeError> {
    serde_json::to_writer(&mut *writer, value).map_err(|err| ServeError::Io(err.to_string()))?;
    writer.write_all(b"\n").map_err(|err| ServeError::Io(err.to_string()))?;
    writer.flush().map_err(|err| ServeError::Io(err.to_string()))
}
