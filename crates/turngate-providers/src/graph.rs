// turngate-providers/src/graph.rs
// ============================================================================
// Module: In-Memory Graph Client
// Description: Mutex-guarded node/edge store implementing GraphClient.
// Purpose: Back the Proof-Chain Builder's typed-edge traversal and the
//          Enforcement Bundle Builder's graph-policy lookups without a real
//          graph database.
// Dependencies: turngate-core, serde_json
// ============================================================================

//! ## Overview
//! [`InMemoryGraphClient`] is deliberately not a query engine: it recognizes
//! the single traversal shape the core crate issues (a one-hop edge lookup
//! keyed by `from` and `edge`) and answers everything else with
//! [`GraphError::QueryFailed`], so callers fall back to AST evidence instead
//! of trusting a query this client cannot actually honor.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::Value;
use turngate_core::GraphClient;
use turngate_core::GraphError;

/// One edge record in a graph seed file: a directed, kind-labeled hop from
/// one node id to another.
#[derive(Debug, Clone, Deserialize)]
struct SeedEdge {
    from: String,
    kind: String,
    to: String,
}

#[derive(Default)]
struct GraphData {
    edges: BTreeMap<(String, String), String>,
}

/// An in-memory graph client seeded from a newline-delimited JSON file of
/// edge records, each `{"from": "...", "kind": "...", "to": "..."}`.
pub struct InMemoryGraphClient {
    data: Mutex<GraphData>,
}

impl InMemoryGraphClient {
    /// Builds a client with no edges loaded.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            data: Mutex::new(GraphData::default()),
        }
    }

    /// Builds a client seeded from a newline-delimited JSON edge file.
    /// Blank lines are skipped; any malformed line fails the whole load,
    /// since a partially-seeded graph would silently degrade every
    /// traversal that depends on it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unavailable`] when the file cannot be read or
    /// a non-blank line is not a valid [`SeedEdge`].
    pub fn from_seed_file(path: &Path) -> Result<Self, GraphError> {
        let contents = fs::read_to_string(path)
            .map_err(|err| GraphError::Unavailable(format!("cannot read graph seed: {err}")))?;
        let mut edges = BTreeMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let edge: SeedEdge = serde_json::from_str(line)
                .map_err(|err| GraphError::Unavailable(format!("invalid graph seed line: {err}")))?;
            edges.insert((edge.from, edge.kind), edge.to);
        }
        Ok(Self {
            data: Mutex::new(GraphData { edges }),
        })
    }

    /// Inserts or replaces a single edge, for callers seeding the graph
    /// incrementally (e.g. from configuration rather than a seed file).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unavailable`] if the internal lock is
    /// poisoned.
    pub fn insert_edge(&self, from: &str, kind: &str, to: &str) -> Result<(), GraphError> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| GraphError::Unavailable("graph lock poisoned".to_owned()))?;
        data.edges.insert((from.to_owned(), kind.to_owned()), to.to_owned());
        Ok(())
    }
}

impl GraphClient for InMemoryGraphClient {
    fn verify_connectivity(&self) -> Result<(), GraphError> {
        if self.data.lock().is_err() {
            return Err(GraphError::Unavailable("graph lock poisoned".to_owned()));
        }
        Ok(())
    }

    fn run_read(&self, query: &str, params: &BTreeMap<String, Value>) -> Result<Vec<Value>, GraphError> {
        if !query.contains("MATCH") || !query.contains("RETURN") {
            return Err(GraphError::QueryFailed(format!("unsupported query shape: {query}")));
        }
        let from = params
            .get("from")
            .and_then(Value::as_str)
            .ok_or_else(|| GraphError::QueryFailed("query requires a 'from' param".to_owned()))?;
        let edge = params
            .get("edge")
            .and_then(Value::as_str)
            .ok_or_else(|| GraphError::QueryFailed("query requires an 'edge' param".to_owned()))?;
        let data = self
            .data
            .lock()
            .map_err(|_| GraphError::Unavailable("graph lock poisoned".to_owned()))?;
        match data.edges.get(&(from.to_owned(), edge.to_owned())) {
            Some(to) => Ok(vec![serde_json::json!({ "id": to })]),
            None => Ok(Vec::new()),
        }
    }
}
