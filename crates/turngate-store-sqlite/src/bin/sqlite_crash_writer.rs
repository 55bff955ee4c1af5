// turngate-store-sqlite/src/bin/sqlite_crash_writer.rs
// ============================================================================
// Module: SQLite Crash Writer
// Description: Helper binary that writes one session snapshot then aborts.
// Purpose: Let the durability test verify a committed write survives an
//          unclean process death.
// Dependencies: turngate-store-sqlite, turngate-core
// ============================================================================

//! ## Overview
//! Invoked as `sqlite_crash_writer <db-path> <session-id>`. The process
//! aborts immediately after the save call returns, so nothing after the
//! commit gets a chance to clean up; whatever survives is what SQLite
//! actually made durable.

use std::path::PathBuf;

use turngate_core::AgentId;
use turngate_core::BudgetStatus;
use turngate_core::RunSessionId;
use turngate_core::SessionState;
use turngate_core::SessionStore;
use turngate_core::WorkId;
use turngate_store_sqlite::SqliteStore;
use turngate_store_sqlite::SqliteStoreError;
use turngate_store_sqlite::SqliteSyncMode;

/// Writes one session snapshot to the database named by the first argument,
/// then aborts the process without unwinding.
fn main() -> Result<(), SqliteStoreError> {
    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| SqliteStoreError::Io("missing db path argument".to_owned()))?;
    let session_id = args
        .next()
        .ok_or_else(|| SqliteStoreError::Io("missing session id argument".to_owned()))?;

    let store = SqliteStore::open(&db_path, SqliteSyncMode::Full, 5_000)?;
    let session = SessionState::new(
        RunSessionId::new(session_id),
        WorkId::new("crash-work"),
        AgentId::new("crash-agent"),
        BudgetStatus {
            max_tokens: 1_000,
            used_tokens: 0,
            threshold_tokens: 900,
            blocked: false,
        },
    );
    store
        .save(&session)
        .map_err(|err| SqliteStoreError::Io(err.to_string()))?;

    // Die without unwinding so no destructor can tidy up after the commit.
    std::process::abort();
}
