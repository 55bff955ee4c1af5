// turngate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Session and Memory Store
// Description: Durable SessionStore and MemoryStore backed by SQLite WAL.
// Purpose: Persist session snapshots, memory records, anchors, and two
//          append-only ledgers with deterministic serialization.
// Dependencies: turngate-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each session save produces a canonical JSON snapshot replacing the prior
//! one; ledgers are append-only and never rewritten. Loads fail closed: a
//! row that no longer deserializes is corruption, not an empty result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use turngate_core::DomainAnchor;
use turngate_core::MemoryId;
use turngate_core::MemoryRecord;
use turngate_core::MemoryState;
use turngate_core::RunSessionId;
use turngate_core::SessionState;
use turngate_core::SessionStore;
use turngate_core::SessionStoreError;
use turngate_core::hashing::canonical_json_bytes;
use turngate_core::interfaces::MemoryStore;
use turngate_core::runtime::memory_service;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Suffix appended to an override file once it has been ingested.
const PROCESSED_SUFFIX: &str = "processed";
/// Maximum size of a single override drop-in file, in bytes.
const MAX_OVERRIDE_FILE_BYTES: u64 = 256 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Normal => "NORMAL",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the SQLite store.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Filesystem or database I/O failed.
    #[error("store io error: {0}")]
    Io(String),
    /// A SQL statement failed.
    #[error("store sqlite error: {0}")]
    Sqlite(String),
    /// A stored row no longer deserializes.
    #[error("store corruption: {0}")]
    Corrupt(String),
    /// An override drop-in file could not be ingested.
    #[error("override ingest error: {0}")]
    Ingest(String),
}

impl From<SqliteStoreError> for SessionStoreError {
    fn from(err: SqliteStoreError) -> Self {
        match err {
            SqliteStoreError::Corrupt(detail) => SessionStoreError::Corrupt(detail),
            other => SessionStoreError::Io(other.to_string()),
        }
    }
}

/// Maps a rusqlite error into the store error type.
fn sql_err(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Sqlite(err.to_string())
}

// ============================================================================
// SECTION: Ledger Types
// ============================================================================

/// One appended row of the friction ledger or changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic append sequence, assigned by the store.
    pub seq: u64,
    /// RFC 3339 timestamp supplied by the caller at append time.
    pub recorded_at: String,
    /// The appended payload.
    pub entry: Value,
}

/// The shape of a human override drop-in file under `overrides/`.
#[derive(Debug, Deserialize)]
struct OverrideFile {
    /// Domain anchors the override applies to.
    domain_anchor_ids: Vec<String>,
    /// How the override's lesson is enforced.
    enforcement_type: turngate_core::EnforcementType,
    /// Who made the override and why.
    provenance: String,
    /// Plan-rule payload, for `plan_rule` overrides.
    #[serde(default)]
    plan_rule: Option<turngate_core::PlanRulePayload>,
    /// Few-shot payload, for `few_shot` overrides.
    #[serde(default)]
    few_shot: Option<turngate_core::FewShotPayload>,
    /// Strategy-signal payload, for `strategy_signal` overrides.
    #[serde(default)]
    strategy_signal: Option<turngate_core::StrategySignalPayload>,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable session and memory store over a single SQLite database.
///
/// # Invariants
/// - The connection always runs in WAL journal mode with foreign keys on.
/// - Ledger tables are append-only; no code path updates or deletes rows.
pub struct SqliteStore {
    /// The guarded connection; SQLite serializes writers anyway, so one
    /// connection under a mutex keeps the store simple and correct.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path`, applying pragmas and the
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn open(
        path: &Path,
        sync_mode: SqliteSyncMode,
        busy_timeout_ms: u64,
    ) -> Result<Self, SqliteStoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
            }
        }
        let conn = Connection::open(path).map_err(|err| sql_err(&err))?;
        Self::initialize(conn, sync_mode, busy_timeout_ms)
    }

    /// Opens an in-memory store, used by tests and ephemeral sessions.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when initialization fails.
    pub fn in_memory() -> Result<Self, SqliteStoreError> {
        let conn = Connection::open_in_memory().map_err(|err| sql_err(&err))?;
        Self::initialize(conn, SqliteSyncMode::Full, 5_000)
    }

    /// Applies pragmas and creates the schema on a fresh connection.
    fn initialize(
        conn: Connection,
        sync_mode: SqliteSyncMode,
        busy_timeout_ms: u64,
    ) -> Result<Self, SqliteStoreError> {
        conn.pragma_update(None, "journal_mode", "WAL").map_err(|err| sql_err(&err))?;
        conn.pragma_update(None, "synchronous", sync_mode.pragma_value())
            .map_err(|err| sql_err(&err))?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(|err| sql_err(&err))?;
        conn.busy_timeout(std::time::Duration::from_millis(busy_timeout_ms))
            .map_err(|err| sql_err(&err))?;

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|err| sql_err(&err))?;
        if version > SCHEMA_VERSION {
            return Err(SqliteStoreError::Corrupt(format!(
                "database schema version {version} is newer than supported {SCHEMA_VERSION}"
            )));
        }
        if version < SCHEMA_VERSION {
            conn.execute_batch(
                "BEGIN;
                 CREATE TABLE IF NOT EXISTS sessions (
                     run_session_id TEXT PRIMARY KEY,
                     state          TEXT NOT NULL,
                     snapshot       TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS memories (
                     id     TEXT PRIMARY KEY,
                     state  TEXT NOT NULL,
                     record TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS anchors (
                     id     TEXT PRIMARY KEY,
                     anchor TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS friction_ledger (
                     seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                     recorded_at TEXT NOT NULL,
                     entry       TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS changelog (
                     seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                     recorded_at TEXT NOT NULL,
                     entry       TEXT NOT NULL
                 );
                 COMMIT;",
            )
            .map_err(|err| sql_err(&err))?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .map_err(|err| sql_err(&err))?;
        }
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Locks the connection, absorbing a poisoned mutex rather than
    /// propagating a panic from another thread.
    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serializes a value as canonical JSON text.
    fn canonical_text<T: Serialize>(value: &T) -> Result<String, SqliteStoreError> {
        let bytes = canonical_json_bytes(value)
            .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        String::from_utf8(bytes).map_err(|err| SqliteStoreError::Io(err.to_string()))
    }

    /// Appends a row to the named ledger table and returns its sequence.
    fn append_ledger(
        &self,
        table: &str,
        recorded_at: &str,
        entry: &Value,
    ) -> Result<u64, SqliteStoreError> {
        let conn = self.lock();
        let text = Self::canonical_text(entry)?;
        conn.execute(
            &format!("INSERT INTO {table} (recorded_at, entry) VALUES (?1, ?2)"),
            params![recorded_at, text],
        )
        .map_err(|err| sql_err(&err))?;
        let seq = conn.last_insert_rowid();
        u64::try_from(seq).map_err(|_| SqliteStoreError::Corrupt("negative ledger sequence".to_owned()))
    }

    /// Reads every row of the named ledger table in append order.
    fn read_ledger(&self, table: &str) -> Result<Vec<LedgerEntry>, SqliteStoreError> {
        let conn = self.lock();
        let mut statement = conn
            .prepare(&format!("SELECT seq, recorded_at, entry FROM {table} ORDER BY seq ASC"))
            .map_err(|err| sql_err(&err))?;
        let rows = statement
            .query_map([], |row| {
                let seq: i64 = row.get(0)?;
                let recorded_at: String = row.get(1)?;
                let entry: String = row.get(2)?;
                Ok((seq, recorded_at, entry))
            })
            .map_err(|err| sql_err(&err))?;
        let mut entries = Vec::new();
        for row in rows {
            let (seq, recorded_at, entry) = row.map_err(|err| sql_err(&err))?;
            let seq = u64::try_from(seq)
                .map_err(|_| SqliteStoreError::Corrupt("negative ledger sequence".to_owned()))?;
            let entry: Value = serde_json::from_str(&entry)
                .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
            entries.push(LedgerEntry { seq, recorded_at, entry });
        }
        Ok(entries)
    }

    /// Appends an entry to the friction ledger.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the append fails.
    pub fn append_friction(&self, recorded_at: &str, entry: &Value) -> Result<u64, SqliteStoreError> {
        self.append_ledger("friction_ledger", recorded_at, entry)
    }

    /// Reads the friction ledger in append order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the read fails.
    pub fn read_friction(&self) -> Result<Vec<LedgerEntry>, SqliteStoreError> {
        self.read_ledger("friction_ledger")
    }

    /// Appends an entry to the changelog.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the append fails.
    pub fn append_changelog(&self, recorded_at: &str, entry: &Value) -> Result<u64, SqliteStoreError> {
        self.append_ledger("changelog", recorded_at, entry)
    }

    /// Reads the changelog in append order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the read fails.
    pub fn read_changelog(&self) -> Result<Vec<LedgerEntry>, SqliteStoreError> {
        self.read_ledger("changelog")
    }

    /// Scans `dir` for `*.json` override drop-ins, ingests each as a memory
    /// record, and renames the file with a `.processed` suffix so a later
    /// scan does not ingest it again. Returns the ingested record ids.
    ///
    /// A file that fails to parse is skipped and left in place so a human
    /// can fix it; one bad file never blocks the rest of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the directory cannot be read or a
    /// parsed record cannot be persisted.
    pub fn ingest_override_files(
        &self,
        dir: &Path,
        initial_state: MemoryState,
        now: &str,
    ) -> Result<Vec<MemoryId>, SqliteStoreError> {
        let mut ingested = Vec::new();
        let entries = fs::read_dir(dir).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| SqliteStoreError::Io(err.to_string()))?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else { continue };
            if fs::metadata(&path).map_or(true, |meta| meta.len() > MAX_OVERRIDE_FILE_BYTES) {
                continue;
            }
            let Ok(bytes) = fs::read(&path) else { continue };
            let Ok(parsed) = serde_json::from_slice::<OverrideFile>(&bytes) else { continue };

            let mut record = memory_service::create_from_human_override(
                memory_service::HumanOverrideInput {
                    domain_anchor_ids: parsed
                        .domain_anchor_ids
                        .into_iter()
                        .map(turngate_core::AnchorId::new)
                        .collect(),
                    enforcement_type: parsed.enforcement_type,
                    initial_state,
                    provenance: parsed.provenance,
                },
                now,
                stem,
            );
            record.plan_rule = parsed.plan_rule;
            record.few_shot = parsed.few_shot;
            record.strategy_signal = parsed.strategy_signal;
            self.save_memory(&record)
                .map_err(|err| SqliteStoreError::Ingest(err.to_string()))?;

            let processed = path.with_extension(format!("json.{PROCESSED_SUFFIX}"));
            fs::rename(&path, &processed).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
            ingested.push(record.id);
        }
        Ok(ingested)
    }

    /// Exports every active memory as line-delimited graph-seed rows under
    /// `out_dir/memory/rows.jsonl`: one `node` row per memory, one
    /// `relationship` row per attached anchor. Returns the row count.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when loading or writing fails.
    pub fn write_graph_seed(&self, out_dir: &Path) -> Result<usize, SqliteStoreError> {
        let memories = self.load_all_memories()?;
        let anchors = self.load_all_anchors()?;
        let seeds = memory_service::export_as_graph_seed(&memories, &anchors)
            .map_err(|err| SqliteStoreError::Io(err.to_string()))?;

        let memory_dir = out_dir.join("memory");
        fs::create_dir_all(&memory_dir).map_err(|err| SqliteStoreError::Io(err.to_string()))?;

        let mut rows = Vec::new();
        for seed in &seeds {
            rows.push(serde_json::json!({
                "kind": "node",
                "id": seed.node_id,
                "labels": ["Memory"],
                "props": { "enforcementType": seed.enforcement_type },
            }));
            for anchor in &seed.applies_to {
                rows.push(serde_json::json!({
                    "kind": "relationship",
                    "type": "APPLIES_TO",
                    "from": seed.node_id,
                    "to": anchor,
                }));
            }
        }

        let mut body = String::new();
        for row in &rows {
            body.push_str(&Self::canonical_text(row)?);
            body.push('\n');
        }
        fs::write(memory_dir.join("rows.jsonl"), body)
            .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        Ok(rows.len())
    }

    /// Loads every memory record, failing closed on any corrupt row.
    fn load_all_memories(&self) -> Result<Vec<MemoryRecord>, SqliteStoreError> {
        let conn = self.lock();
        let mut statement = conn
            .prepare("SELECT record FROM memories ORDER BY id ASC")
            .map_err(|err| sql_err(&err))?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| sql_err(&err))?;
        let mut records = Vec::new();
        for row in rows {
            let text = row.map_err(|err| sql_err(&err))?;
            let record: MemoryRecord = serde_json::from_str(&text)
                .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Loads every domain anchor, failing closed on any corrupt row.
    fn load_all_anchors(&self) -> Result<Vec<DomainAnchor>, SqliteStoreError> {
        let conn = self.lock();
        let mut statement = conn
            .prepare("SELECT anchor FROM anchors ORDER BY id ASC")
            .map_err(|err| sql_err(&err))?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| sql_err(&err))?;
        let mut anchors = Vec::new();
        for row in rows {
            let text = row.map_err(|err| sql_err(&err))?;
            let anchor: DomainAnchor = serde_json::from_str(&text)
                .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
            anchors.push(anchor);
        }
        Ok(anchors)
    }
}

// ============================================================================
// SECTION: Trait Implementations
// ============================================================================

impl SessionStore for SqliteStore {
    fn load(&self, run_session_id: &RunSessionId) -> Result<Option<SessionState>, SessionStoreError> {
        let conn = self.lock();
        let snapshot: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM sessions WHERE run_session_id = ?1",
                params![run_session_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SessionStoreError::Io(err.to_string()))?;
        match snapshot {
            None => Ok(None),
            Some(text) => {
                let state: SessionState = serde_json::from_str(&text)
                    .map_err(|err| SessionStoreError::Corrupt(err.to_string()))?;
                Ok(Some(state))
            }
        }
    }

    fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        let text = Self::canonical_text(state).map_err(SessionStoreError::from)?;
        let state_tag = serde_json::to_string(&state.state)
            .map_err(|err| SessionStoreError::Io(err.to_string()))?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO sessions (run_session_id, state, snapshot) VALUES (?1, ?2, ?3)
             ON CONFLICT(run_session_id) DO UPDATE SET state = ?2, snapshot = ?3",
            params![state.run_session_id.as_str(), state_tag, text],
        )
        .map_err(|err| SessionStoreError::Io(err.to_string()))?;
        Ok(())
    }
}

impl MemoryStore for SqliteStore {
    fn load_memories(&self) -> Result<Vec<MemoryRecord>, SessionStoreError> {
        self.load_all_memories().map_err(SessionStoreError::from)
    }

    fn save_memory(&self, record: &MemoryRecord) -> Result<(), SessionStoreError> {
        let text = Self::canonical_text(record).map_err(SessionStoreError::from)?;
        let state_tag = serde_json::to_string(&record.state)
            .map_err(|err| SessionStoreError::Io(err.to_string()))?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO memories (id, state, record) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET state = ?2, record = ?3",
            params![record.id.as_str(), state_tag, text],
        )
        .map_err(|err| SessionStoreError::Io(err.to_string()))?;
        Ok(())
    }

    fn load_anchors(&self) -> Result<Vec<DomainAnchor>, SessionStoreError> {
        self.load_all_anchors().map_err(SessionStoreError::from)
    }

    fn save_anchor(&self, anchor: &DomainAnchor) -> Result<(), SessionStoreError> {
        let text = Self::canonical_text(anchor).map_err(SessionStoreError::from)?;
        let conn = self.lock();
        conn.execute(
            "INSERT INTO anchors (id, anchor) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET anchor = ?2",
            params![anchor.id.as_str(), text],
        )
        .map_err(|err| SessionStoreError::Io(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
