// turngate-providers/src/sandbox.rs
// ============================================================================
// Module: Process Sandbox
// Description: Sandbox implementation that runs code under a configured
//              interpreter with a hard wall-clock deadline.
// Purpose: Give run_sandboxed_code a real, killable execution backend
//          instead of trusting the agent's claim that a check ran.
// Dependencies: turngate-core
// ============================================================================

//! ## Overview
//! [`ProcessSandbox`] spawns the configured interpreter with the code body
//! appended as its final argument, polls for completion, and kills the
//! process the moment the wall-clock deadline passes. The memory cap is
//! exported to the child as `TURNGATE_SANDBOX_MEMORY_CAP_MB`; a child the
//! operating system kills over it surfaces as a failed run. Nothing here
//! interprets the code itself, so the interpreter choice (and its own
//! isolation) is the operator's call.

use std::io::Read;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use turngate_core::Sandbox;
use turngate_core::SandboxCaps;
use turngate_core::SandboxError;
use turngate_core::SandboxRun;

/// Environment variable the memory cap is exported through.
pub const MEMORY_CAP_ENV_VAR: &str = "TURNGATE_SANDBOX_MEMORY_CAP_MB";

/// How often the deadline loop polls a still-running child.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A [`Sandbox`] that executes code through a configured interpreter argv,
/// e.g. `["node", "-e"]` or `["sh", "-c"]`.
///
/// # Invariants
/// - The interpreter argv is non-empty with non-empty components.
/// - A run past its deadline is killed and reported as
///   [`SandboxError::TimedOut`], never waited out.
pub struct ProcessSandbox {
    /// Interpreter argv the code body is appended to.
    interpreter: Vec<String>,
}

impl ProcessSandbox {
    /// Builds a sandbox around the given interpreter argv.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Unavailable`] when the argv is empty or has
    /// an empty component.
    pub fn new(interpreter: Vec<String>) -> Result<Self, SandboxError> {
        if interpreter.is_empty() || interpreter.iter().any(String::is_empty) {
            return Err(SandboxError::Unavailable(
                "sandbox interpreter argv must be non-empty".to_owned(),
            ));
        }
        Ok(Self { interpreter })
    }
}

/// Reads a child's captured stream to a string, best effort.
fn drain(stream: Option<impl Read>) -> String {
    let mut buffer = String::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_string(&mut buffer);
    }
    buffer
}

impl Sandbox for ProcessSandbox {
    fn execute(&self, iife: &str, caps: &SandboxCaps) -> Result<SandboxRun, SandboxError> {
        let started = Instant::now();
        let mut child = Command::new(&self.interpreter[0])
            .args(&self.interpreter[1..])
            .arg(iife)
            .env(MEMORY_CAP_ENV_VAR, caps.memory_cap_mb.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| SandboxError::Unavailable(format!("sandbox spawn failed: {err}")))?;

        let deadline = Duration::from_millis(caps.timeout_ms);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let output = drain(child.stdout.take());
                    if !status.success() {
                        let stderr = drain(child.stderr.take());
                        let detail = if stderr.trim().is_empty() { output } else { stderr };
                        return Err(SandboxError::Failed(format!(
                            "exit status {status}: {}",
                            detail.trim()
                        )));
                    }
                    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    return Ok(SandboxRun { output, elapsed_ms: elapsed });
                }
                Ok(None) => {
                    if started.elapsed() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SandboxError::TimedOut { limit_ms: caps.timeout_ms });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SandboxError::Unavailable(format!("sandbox wait failed: {err}")));
                }
            }
        }
    }
}
