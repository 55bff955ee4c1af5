// turngate-store-sqlite/src/lib.rs
// ============================================================================
// Module: Turngate SQLite Store Library
// Description: Durable SessionStore and MemoryStore backed by SQLite.
// Purpose: Persist session snapshots, memory records, anchors, and the
//          append-only friction and changelog ledgers across process restarts.
// Dependencies: turngate-core, rusqlite
// ============================================================================

//! ## Overview
//! One SQLite database (WAL journal) holds everything turngate persists:
//! session snapshots, memory records, domain anchors, and two append-only
//! ledgers. The store also owns the filesystem edges of the memory
//! lifecycle: ingesting human override drop-in files and exporting the
//! graph seed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::LedgerEntry;
pub use store::SqliteStore;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
