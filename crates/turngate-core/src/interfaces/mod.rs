// turngate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Turngate Interfaces
// Description: Backend-agnostic interfaces for indexing, graph access, and
//              external connectors.
// Purpose: Define the contract surfaces the runtime integrates through, so
//          the core crate never depends on a concrete search, graph, or HTTP
//          backend.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Implementations must be deterministic given their backing state and fail
//! closed on missing or invalid data. The runtime only ever holds these as
//! trait objects, never as concrete types, so a session can be wired against
//! real infrastructure or an in-memory stand-in without changing dispatcher
//! code.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::DomainAnchor;
use crate::core::MemoryRecord;
use crate::core::RunSessionId;
use crate::core::SessionState;
use crate::core::VerbName;

/// A symbol definition match returned by an indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    /// Fully qualified symbol name.
    pub symbol: String,
    /// File path the symbol is defined in.
    pub file: String,
    /// One-based line number of the definition.
    pub line: u32,
    /// A short snippet around the definition.
    pub snippet: String,
}

/// A lexical text search hit returned by an indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextHit {
    /// File path the match occurred in.
    pub file: String,
    /// One-based line number of the match.
    pub line: u32,
    /// The matching line's text.
    pub text: String,
}

/// Indexer errors.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// The index is unavailable or unreachable.
    #[error("indexer unavailable: {0}")]
    Unavailable(String),
    /// The query was malformed.
    #[error("invalid indexer query: {0}")]
    InvalidQuery(String),
}

/// Backend-agnostic source code indexer.
///
/// Implementations back the read verbs that let an agent gather evidence
/// without the controller shelling out to the filesystem or a language
/// server directly.
pub trait Indexer {
    /// Searches for a symbol by name or fuzzy match.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError`] when the index cannot be queried.
    fn search_symbol(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>, IndexerError>;

    /// Runs a lexical text search across indexed files.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError`] when the index cannot be queried.
    fn search_lexical(&self, query: &str, limit: usize) -> Result<Vec<TextHit>, IndexerError>;

    /// Lists file paths currently covered by the index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError`] when the index cannot be queried.
    fn list_indexed_files(&self) -> Result<Vec<String>, IndexerError>;

    /// Lists directory entries beneath `path`, relative to the worktree root.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError`] when the index cannot be queried.
    fn list_directory(&self, path: &str) -> Result<Vec<String>, IndexerError>;

    /// Reads a one-based, inclusive line range from a file.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError`] when the file cannot be read.
    fn read_lines(&self, file: &str, start: u32, end: u32) -> Result<Vec<String>, IndexerError>;
}

/// Graph client errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph backend is unreachable.
    #[error("graph client unavailable: {0}")]
    Unavailable(String),
    /// The query was rejected by the backend.
    #[error("graph query failed: {0}")]
    QueryFailed(String),
}

/// Backend-agnostic knowledge graph client.
///
/// Backs `trace_symbol_graph` and the proof-chain builder's traversal of
/// ag-Grid and federation reference chains.
pub trait GraphClient {
    /// Verifies the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unavailable`] when it is not.
    fn verify_connectivity(&self) -> Result<(), GraphError>;

    /// Runs a read-only traversal and returns matched rows as JSON values.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when the query fails.
    fn run_read(
        &self,
        query: &str,
        params: &BTreeMap<String, Value>,
    ) -> Result<Vec<Value>, GraphError>;
}

/// Connector errors.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The external system is unreachable.
    #[error("connector unavailable: {0}")]
    Unavailable(String),
    /// The requested resource does not exist.
    #[error("connector resource not found: {0}")]
    NotFound(String),
}

/// A fetched external artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Identifies this artifact.
    pub id: String,
    /// The kind of artifact, e.g. `"jira_issue"` or `"api_spec"`.
    pub kind: String,
    /// Opaque reference to where the full content is stored.
    pub content_ref: String,
    /// A short human-readable summary.
    pub summary: String,
}

/// Backend-agnostic external system connector.
///
/// Backs `fetch_jira_ticket` and `fetch_api_spec`.
pub trait Connector {
    /// Fetches an issue-tracker ticket by key.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the ticket cannot be fetched.
    fn fetch_ticket(&self, key: &str) -> Result<Artifact, ConnectorError>;

    /// Registers an external API specification by URL as an artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] when the specification cannot be fetched.
    fn fetch_api_spec(&self, url: &str) -> Result<Artifact, ConnectorError>;
}

/// Resource caps applied to one sandbox run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxCaps {
    /// Wall-clock timeout in milliseconds.
    pub timeout_ms: u64,
    /// Memory cap in mebibytes.
    pub memory_cap_mb: u64,
}

/// The observed outcome of a sandbox run that completed within its caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxRun {
    /// Captured standard output.
    pub output: String,
    /// Wall-clock time the run took, in milliseconds.
    pub elapsed_ms: u64,
}

/// Sandbox errors. Cap breaches are distinct variants so the verb handler
/// can name the limit that was hit.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The run exceeded its wall-clock timeout and was killed.
    #[error("sandbox run exceeded its {limit_ms} ms timeout")]
    TimedOut {
        /// The timeout that was breached, in milliseconds.
        limit_ms: u64,
    },
    /// The run exceeded its memory cap and was killed.
    #[error("sandbox run exceeded its {limit_mb} MiB memory cap")]
    MemoryExceeded {
        /// The memory cap that was breached, in mebibytes.
        limit_mb: u64,
    },
    /// The run exited unsuccessfully.
    #[error("sandbox run failed: {0}")]
    Failed(String),
    /// No executor is available to run the code.
    #[error("sandbox unavailable: {0}")]
    Unavailable(String),
}

/// Bounded executor backing `run_sandboxed_code`.
///
/// Implementations must enforce the caps they are handed: a run that
/// breaches them is killed and reported as the matching [`SandboxError`]
/// variant, never allowed to finish as a success.
pub trait Sandbox {
    /// Runs `iife` under `caps` and returns its observed outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] on a cap breach, a failed run, or a missing
    /// executor.
    fn execute(&self, iife: &str, caps: &SandboxCaps) -> Result<SandboxRun, SandboxError>;
}

/// A [`Sandbox`] that performs no execution: the preflight decision stands
/// on the plan and collision checks alone. Used where no executor has been
/// wired in, such as unit tests and executor-less deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreflightSandbox;

impl Sandbox for PreflightSandbox {
    fn execute(&self, _iife: &str, _caps: &SandboxCaps) -> Result<SandboxRun, SandboxError> {
        Ok(SandboxRun {
            output: "preflight only; no sandbox executor is wired".to_owned(),
            elapsed_ms: 0,
        })
    }
}

/// Session store errors.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Storage I/O error.
    #[error("session store io error: {0}")]
    Io(String),
    /// Stored data failed an integrity check.
    #[error("session store corruption: {0}")]
    Corrupt(String),
}

/// Durable storage for session state.
pub trait SessionStore {
    /// Loads session state by id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when loading fails.
    fn load(&self, run_session_id: &RunSessionId) -> Result<Option<SessionState>, SessionStoreError>;

    /// Saves session state, overwriting any prior snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when saving fails.
    fn save(&self, state: &SessionState) -> Result<(), SessionStoreError>;
}

/// Durable storage for memory records and domain anchors.
pub trait MemoryStore {
    /// Loads every memory record currently at rest.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when loading fails.
    fn load_memories(&self) -> Result<Vec<MemoryRecord>, SessionStoreError>;

    /// Persists a memory record, inserting or replacing by id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when saving fails.
    fn save_memory(&self, record: &MemoryRecord) -> Result<(), SessionStoreError>;

    /// Loads the domain anchor tree.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when loading fails.
    fn load_anchors(&self) -> Result<Vec<DomainAnchor>, SessionStoreError>;

    /// Persists a domain anchor, inserting or replacing by id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] when saving fails.
    fn save_anchor(&self, anchor: &DomainAnchor) -> Result<(), SessionStoreError>;
}

/// Observability hook the dispatcher calls on notable events.
///
/// Kept as an injected trait object, the way collaborators like the
/// connector and indexer are injected, so `turngate-core` never takes a
/// direct dependency on a logging framework; binaries wire in a concrete
/// implementation.
pub trait TurnLogger {
    /// Called when a verb is denied, with its code and the session it denied.
    fn verb_denied(&self, run_session_id: &RunSessionId, verb: VerbName, code: &str);

    /// Called when a verb is accepted and applied.
    fn verb_accepted(&self, run_session_id: &RunSessionId, verb: VerbName);

    /// Called when a background operation (memory promotion, anchor seeding)
    /// fails without a session to report the failure to directly.
    fn background_failure(&self, operation: &str, detail: &str);
}

/// A [`TurnLogger`] that discards every event, used where no observability
/// sink has been wired in, such as unit tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTurnLogger;

impl TurnLogger for NoopTurnLogger {
    fn verb_denied(&self, _run_session_id: &RunSessionId, _verb: VerbName, _code: &str) {}
    fn verb_accepted(&self, _run_session_id: &RunSessionId, _verb: VerbName) {}
    fn background_failure(&self, _operation: &str, _detail: &str) {}
}
