// turngate-cli/src/protocol.rs
// ============================================================================
// Module: Wire Protocol Framing
// Description: The newline-delimited JSON request frame the serve loop reads.
// Purpose: Decode one request per line and keep protocol-level failures out
//          of session state entirely.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! One JSON object per line: `{"verb", "args", "runSessionId", "workId",
//! "agentId"}`. A line that fails to decode produces a protocol error
//! object on stdout and touches no session.

use serde::Deserialize;
use serde_json::Value;

/// One decoded request line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFrame {
    /// The verb wire name.
    pub verb: String,
    /// Verb arguments, passed through to the dispatcher untouched.
    #[serde(default)]
    pub args: Value,
    /// The session this call addresses; created on first reference.
    pub run_session_id: String,
    /// The unit of work the session addresses.
    pub work_id: String,
    /// The calling agent.
    pub agent_id: String,
}

impl RequestFrame {
    /// Decodes a request frame from one input line.
    ///
    /// # Errors
    ///
    /// Returns the decode error message when the line is not a valid frame.
    pub fn decode(line: &str) -> Result<Self, String> {
        serde_json::from_str(line).map_err(|err| err.to_string())
    }
}

/// Builds the protocol-level error object emitted for an undecodable line
/// or an unknown verb. Mirrors JSON-RPC's invalid-request semantics without
/// carrying the full JSON-RPC envelope.
#[must_use]
pub fn protocol_error(code: i64, detail: &str) -> Value {
    serde_json::json!({
        "protocolError": { "code": code, "message": detail },
        "schemaVersion": "1",
    })
}

/// Protocol error code for a line that is not a valid request frame.
pub const INVALID_REQUEST: i64 = -32600;
/// Protocol error code for a verb name no dispatcher route exists for.
pub const METHOD_NOT_FOUND: i64 = -32601;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_full_frame_decodes() {
        let frame = RequestFrame::decode(
            r#"{"verb":"initialize_work","args":{"prompt":"p"},"runSessionId":"s1","workId":"w1","agentId":"a1"}"#,
        )
        .expect("decodes");
        assert_eq!(frame.verb, "initialize_work");
        assert_eq!(frame.args["prompt"], "p");
    }

    #[test]
    fn args_default_to_null_when_absent() {
        let frame = RequestFrame::decode(
            r#"{"verb":"list_available_verbs","runSessionId":"s1","workId":"w1","agentId":"a1"}"#,
        )
        .expect("decodes");
        assert!(frame.args.is_null());
    }

    #[test]
    fn a_missing_session_id_is_a_decode_error() {
        assert!(RequestFrame::decode(r#"{"verb":"x","workId":"w1","agentId":"a1"}"#).is_err());
    }
}
