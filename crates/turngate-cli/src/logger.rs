// turngate-cli/src/logger.rs
// ============================================================================
// Module: Stderr Turn Logger
// Description: TurnLogger implementation writing one line per event to stderr.
// Purpose: Keep stdout clean for response frames while still giving an
//          operator a live audit trail.
// Dependencies: turngate-core
// ============================================================================

//! `TurnLogger` implementation writing one line per event to stderr, keeping
//! stdout clean for response frames.

use std::io::Write;

use turngate_core::RunSessionId;
use turngate_core::TurnLogger;
use turngate_core::VerbName;

/// A [`TurnLogger`] that writes one structured line per event to stderr.
///
/// Logging failures are swallowed: losing a log line must never fail a verb.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrTurnLogger;

impl StderrTurnLogger {
    /// Writes one line to stderr, ignoring write failures.
    fn line(&self, message: &str) {
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "{message}");
    }
}

impl TurnLogger for StderrTurnLogger {
    fn verb_denied(&self, run_session_id: &RunSessionId, verb: VerbName, code: &str) {
        self.line(&format!("turngate session={run_session_id} verb={verb} denied={code}"));
    }

    fn verb_accepted(&self, run_session_id: &RunSessionId, verb: VerbName) {
        self.line(&format!("turngate session={run_session_id} verb={verb} accepted"));
    }

    fn background_failure(&self, operation: &str, detail: &str) {
        self.line(&format!("turngate background operation={operation} failed: {detail}"));
    }
}
