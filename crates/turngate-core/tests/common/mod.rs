// turngate-core/tests/common/mod.rs
// ============================================================================
// Module: Integration Test Support
// Description: Stub collaborators and plan builders shared by the suites.
// Purpose: Keep each suite focused on one behavior instead of repeating
//          harness plumbing.
// Dependencies: turngate-core
// ============================================================================

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::cast_possible_truncation,
    reason = "Shared test support; each suite uses a different subset."
)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;
use turngate_core::AgentId;
use turngate_core::Artifact;
use turngate_core::AtomicityBoundary;
use turngate_core::BudgetStatus;
use turngate_core::ChangeNode;
use turngate_core::CollisionGuard;
use turngate_core::CommitGateId;
use turngate_core::Connector;
use turngate_core::ConnectorError;
use turngate_core::Dependencies;
use turngate_core::DomainAnchor;
use turngate_core::EscalateNode;
use turngate_core::EvidencePolicy;
use turngate_core::GraphClient;
use turngate_core::GraphError;
use turngate_core::Indexer;
use turngate_core::IndexerError;
use turngate_core::MemoryRecord;
use turngate_core::NodeId;
use turngate_core::NoopTurnLogger;
use turngate_core::PackRef;
use turngate_core::PlanGraphDocument;
use turngate_core::PlanNode;
use turngate_core::PlanNodeKind;
use turngate_core::RunSessionId;
use turngate_core::SessionState;
use turngate_core::SessionStoreError;
use turngate_core::SideEffectNode;
use turngate_core::StrategyId;
use turngate_core::StrategyReason;
use turngate_core::SymbolMatch;
use turngate_core::TextHit;
use turngate_core::ValidateNode;
use turngate_core::VerbCall;
use turngate_core::VerbName;
use turngate_core::WorkId;
use turngate_core::hashing::HashAlgorithm;
use turngate_core::hashing::hash_bytes;
use turngate_core::interfaces::MemoryStore;
use turngate_core::runtime::GraphPolicyNode;
use turngate_core::runtime::SessionLayout;

// ============================================================================
// SECTION: Stub Collaborators
// ============================================================================

/// Indexer over a fixed map of file path to lines.
pub struct StubIndexer {
    /// File contents, keyed by repo-relative path.
    pub files: BTreeMap<String, Vec<String>>,
}

impl StubIndexer {
    pub fn empty() -> Self {
        Self { files: BTreeMap::new() }
    }

    pub fn with_files(entries: &[(&str, &str)]) -> Self {
        let files = entries
            .iter()
            .map(|(path, body)| {
                ((*path).to_owned(), body.lines().map(str::to_owned).collect::<Vec<_>>())
            })
            .collect();
        Self { files }
    }
}

impl Indexer for StubIndexer {
    fn search_symbol(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>, IndexerError> {
        let mut matches = Vec::new();
        for (file, lines) in &self.files {
            for (index, line) in lines.iter().enumerate() {
                if line.contains(query) && matches.len() < limit {
                    matches.push(SymbolMatch {
                        symbol: query.to_owned(),
                        file: file.clone(),
                        line: u32::try_from(index + 1).expect("small line count"),
                        snippet: line.clone(),
                    });
                }
            }
        }
        Ok(matches)
    }

    fn search_lexical(&self, query: &str, limit: usize) -> Result<Vec<TextHit>, IndexerError> {
        let mut hits = Vec::new();
        for (file, lines) in &self.files {
            for (index, line) in lines.iter().enumerate() {
                if line.contains(query) && hits.len() < limit {
                    hits.push(TextHit {
                        file: file.clone(),
                        line: u32::try_from(index + 1).expect("small line count"),
                        text: line.clone(),
                    });
                }
            }
        }
        Ok(hits)
    }

    fn list_indexed_files(&self) -> Result<Vec<String>, IndexerError> {
        Ok(self.files.keys().cloned().collect())
    }

    fn list_directory(&self, path: &str) -> Result<Vec<String>, IndexerError> {
        Ok(self
            .files
            .keys()
            .filter(|file| file.starts_with(path))
            .cloned()
            .collect())
    }

    fn read_lines(&self, file: &str, start: u32, end: u32) -> Result<Vec<String>, IndexerError> {
        let lines = self
            .files
            .get(file)
            .ok_or_else(|| IndexerError::Unavailable(format!("no such file: {file}")))?;
        let start = start.saturating_sub(1) as usize;
        let end = (end as usize).min(lines.len());
        Ok(lines.get(start..end).unwrap_or_default().to_vec())
    }
}

/// Graph client answering the one-hop query from a scripted edge map.
pub struct ScriptedGraph {
    /// Directed edges keyed by `(from, edge_kind)`.
    pub edges: BTreeMap<(String, String), String>,
}

impl ScriptedGraph {
    pub fn empty() -> Self {
        Self { edges: BTreeMap::new() }
    }

    pub fn with_edges(edges: &[(&str, &str, &str)]) -> Self {
        Self {
            edges: edges
                .iter()
                .map(|(from, kind, to)| (((*from).to_owned(), (*kind).to_owned()), (*to).to_owned()))
                .collect(),
        }
    }
}

impl GraphClient for ScriptedGraph {
    fn verify_connectivity(&self) -> Result<(), GraphError> {
        Ok(())
    }

    fn run_read(&self, _query: &str, params: &BTreeMap<String, Value>) -> Result<Vec<Value>, GraphError> {
        let from = params.get("from").and_then(Value::as_str).unwrap_or_default();
        let edge = params.get("edge").and_then(Value::as_str).unwrap_or_default();
        match self.edges.get(&(from.to_owned(), edge.to_owned())) {
            Some(to) => Ok(vec![serde_json::json!({ "id": to })]),
            None => Ok(Vec::new()),
        }
    }
}

/// Graph client whose every query fails, for fallback behavior.
pub struct DownGraph;

impl GraphClient for DownGraph {
    fn verify_connectivity(&self) -> Result<(), GraphError> {
        Err(GraphError::Unavailable("down for the test".to_owned()))
    }

    fn run_read(&self, _query: &str, _params: &BTreeMap<String, Value>) -> Result<Vec<Value>, GraphError> {
        Err(GraphError::Unavailable("down for the test".to_owned()))
    }
}

/// Connector that always reports itself missing.
pub struct NoConnector;

impl Connector for NoConnector {
    fn fetch_ticket(&self, key: &str) -> Result<Artifact, ConnectorError> {
        Err(ConnectorError::Unavailable(format!("no connector for {key}")))
    }

    fn fetch_api_spec(&self, url: &str) -> Result<Artifact, ConnectorError> {
        Err(ConnectorError::Unavailable(format!("no connector for {url}")))
    }
}

/// Connector that resolves every fetch to a canned artifact.
pub struct CannedConnector;

impl Connector for CannedConnector {
    fn fetch_ticket(&self, key: &str) -> Result<Artifact, ConnectorError> {
        Ok(Artifact {
            id: format!("artifact-{key}"),
            kind: "jira_issue".to_owned(),
            content_ref: format!("store://jira/{key}"),
            summary: format!("ticket {key}"),
        })
    }

    fn fetch_api_spec(&self, url: &str) -> Result<Artifact, ConnectorError> {
        Ok(Artifact {
            id: "artifact-spec".to_owned(),
            kind: "api_spec".to_owned(),
            content_ref: format!("store://spec/{url}"),
            summary: "api spec".to_owned(),
        })
    }
}

/// Memory store over a plain in-memory vector.
#[derive(Default)]
pub struct VecMemoryStore {
    /// Stored records.
    pub memories: Mutex<Vec<MemoryRecord>>,
    /// Stored anchors.
    pub anchors: Mutex<Vec<DomainAnchor>>,
}

impl VecMemoryStore {
    pub fn with_memories(memories: Vec<MemoryRecord>) -> Self {
        Self {
            memories: Mutex::new(memories),
            anchors: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryStore for VecMemoryStore {
    fn load_memories(&self) -> Result<Vec<MemoryRecord>, SessionStoreError> {
        Ok(self.memories.lock().expect("lock").clone())
    }

    fn save_memory(&self, record: &MemoryRecord) -> Result<(), SessionStoreError> {
        let mut memories = self.memories.lock().expect("lock");
        memories.retain(|existing| existing.id != record.id);
        memories.push(record.clone());
        Ok(())
    }

    fn load_anchors(&self) -> Result<Vec<DomainAnchor>, SessionStoreError> {
        Ok(self.anchors.lock().expect("lock").clone())
    }

    fn save_anchor(&self, anchor: &DomainAnchor) -> Result<(), SessionStoreError> {
        let mut anchors = self.anchors.lock().expect("lock");
        anchors.retain(|existing| existing.id != anchor.id);
        anchors.push(anchor.clone());
        Ok(())
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Everything a suite needs to drive the dispatcher against stubs.
pub struct Harness {
    pub session: SessionState,
    pub layout: SessionLayout,
    pub collision_guard: CollisionGuard,
    pub indexer: StubIndexer,
    pub graph: ScriptedGraph,
    pub connector: Box<dyn Connector>,
    pub sandbox: Box<dyn turngate_core::Sandbox>,
    pub memory_store: VecMemoryStore,
    pub graph_policies: Vec<GraphPolicyNode>,
    call_seq: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            session: turngate_core::new_session(
                RunSessionId::new("s1"),
                WorkId::new("w1"),
                AgentId::new("a1"),
                BudgetStatus {
                    max_tokens: 100_000,
                    used_tokens: 0,
                    threshold_tokens: 90_000,
                    blocked: false,
                },
            ),
            layout: SessionLayout {
                worktree_root: std::path::PathBuf::from("/work"),
                scratch_prefix: "scratch".to_owned(),
                sandbox_caps: turngate_core::SandboxCaps {
                    timeout_ms: 10_000,
                    memory_cap_mb: 256,
                },
            },
            collision_guard: CollisionGuard::new(),
            indexer: StubIndexer::empty(),
            graph: ScriptedGraph::empty(),
            connector: Box::new(NoConnector),
            sandbox: Box::new(turngate_core::PreflightSandbox),
            memory_store: VecMemoryStore::default(),
            graph_policies: Vec::new(),
            call_seq: 0,
        }
    }

    /// Dispatches one verb call and returns the envelope.
    pub fn call(
        &mut self,
        verb: VerbName,
        args: Value,
    ) -> turngate_core::ResponseEnvelope<Value> {
        self.call_seq += 1;
        let deps = Dependencies {
            indexer: &self.indexer,
            graph: &self.graph,
            connector: self.connector.as_ref(),
            sandbox: self.sandbox.as_ref(),
            memory_store: &self.memory_store,
            collision_guard: &self.collision_guard,
            logger: &NoopTurnLogger,
            graph_policies: &self.graph_policies,
        };
        turngate_core::handle(
            &mut self.session,
            VerbCall { verb, args, call_seq: self.call_seq },
            &self.layout,
            &deps,
        )
    }

    /// Initializes the session and asserts the transition succeeded.
    pub fn initialize(&mut self, prompt: &str) -> turngate_core::ResponseEnvelope<Value> {
        let envelope = self.call(
            VerbName::InitializeWork,
            serde_json::json!({ "prompt": prompt }),
        );
        assert!(envelope.deny_reasons.is_empty(), "initialize denied: {:?}", envelope.deny_reasons);
        envelope
    }

    /// Widens the session's pack so mutation targets pass the pack check.
    pub fn put_in_pack(&mut self, files: &[&str]) {
        let pack = self.session.context_pack.as_mut().expect("pack present");
        turngate_core::runtime::pack_service::enrich(
            pack,
            files.iter().map(|f| (*f).to_owned()).collect::<Vec<_>>(),
            std::iter::empty::<String>(),
        );
    }
}

// ============================================================================
// SECTION: Plan Builders
// ============================================================================

/// A boundary that satisfies the non-empty atomicity invariant.
pub fn boundary() -> AtomicityBoundary {
    AtomicityBoundary {
        in_scope_acceptance_criteria_ids: vec!["AC-1".to_owned()],
        in_scope_modules: vec!["src".to_owned()],
        ..Default::default()
    }
}

/// A change node with two distinct evidence sources.
pub fn change_node(id: &str, target_file: &str) -> PlanNode {
    PlanNode {
        node_id: NodeId::new(id),
        depends_on: Vec::new(),
        expected_failure_signatures: Vec::new(),
        atomicity_boundary: boundary(),
        kind: PlanNodeKind::Change(ChangeNode {
            operation: "add_field".to_owned(),
            target_file: target_file.to_owned(),
            target_symbols: vec!["WidgetFactory::build".to_owned()],
            why_this_file: "owns the factory".to_owned(),
            edit_intent: "add the requested option".to_owned(),
            escalate_if: vec!["the file is generated".to_owned()],
            citations: vec!["TICKET-1".to_owned()],
            code_evidence: vec![format!("{target_file}:10")],
            artifact_refs: Vec::new(),
            policy_refs: Vec::new(),
            verification_hooks: vec!["factory_unit".to_owned()],
            low_evidence_guard: None,
            uncertainty_note: None,
            requires_human_review: None,
        }),
    }
}

/// A validate node mapping to `maps_to`, depending on it.
pub fn validate_node(id: &str, maps_to: &str) -> PlanNode {
    PlanNode {
        node_id: NodeId::new(id),
        depends_on: vec![NodeId::new(maps_to)],
        expected_failure_signatures: Vec::new(),
        atomicity_boundary: boundary(),
        kind: PlanNodeKind::Validate(ValidateNode {
            verification_hooks: vec!["factory_unit".to_owned()],
            maps_to_node_ids: vec![NodeId::new(maps_to)],
            success_criteria: vec!["the unit suite passes".to_owned()],
        }),
    }
}

/// A side-effect node gated on `gate`, depending on `depends_on`.
pub fn side_effect_node(id: &str, gate: &str, depends_on: &str) -> PlanNode {
    PlanNode {
        node_id: NodeId::new(id),
        depends_on: vec![NodeId::new(depends_on)],
        expected_failure_signatures: Vec::new(),
        atomicity_boundary: boundary(),
        kind: PlanNodeKind::SideEffect(SideEffectNode {
            side_effect_type: "notify".to_owned(),
            side_effect_payload_ref: "payload-1".to_owned(),
            commit_gate_id: CommitGateId::new(gate),
        }),
    }
}

/// An escalate node asking for one artifact fetch.
pub fn escalate_node(id: &str) -> PlanNode {
    PlanNode {
        node_id: NodeId::new(id),
        depends_on: Vec::new(),
        expected_failure_signatures: Vec::new(),
        atomicity_boundary: boundary(),
        kind: PlanNodeKind::Escalate(EscalateNode {
            requested_evidence: vec![turngate_core::RequestedEvidence {
                request_type: turngate_core::EvidenceRequestType::ArtifactFetch,
                detail: "fetch the referenced ticket".to_owned(),
            }],
            blocking_reasons: vec!["the ticket is the only requirement source".to_owned()],
        }),
    }
}

/// A plan over `nodes` whose envelope matches the default harness session.
pub fn plan_with_nodes(nodes: Vec<PlanNode>) -> PlanGraphDocument {
    PlanGraphDocument {
        work_id: WorkId::new("w1"),
        agent_id: AgentId::new("a1"),
        run_session_id: RunSessionId::new("s1"),
        repo_snapshot_id: "snap-1".to_owned(),
        worktree_root: "/work".to_owned(),
        context_pack_ref: PackRef::new("s1-pack"),
        context_pack_hash: hash_bytes(HashAlgorithm::Sha256, b""),
        scope_allowlist_ref: None,
        knowledge_strategy_id: StrategyId::new("default"),
        strategy_reasons: vec![StrategyReason {
            reason: "no special signals matched".to_owned(),
            evidence_ref: "prompt".to_owned(),
        }],
        plan_fingerprint: None,
        schema_version: "1".to_owned(),
        evidence_policy: EvidencePolicy::default(),
        source_trace_refs: vec!["trace-1".to_owned()],
        nodes,
    }
}

/// The minimal accepted plan: one change covered by one validate.
pub fn minimal_plan() -> PlanGraphDocument {
    plan_with_nodes(vec![
        change_node("change-1", "src/factory.ts"),
        validate_node("validate-1", "change-1"),
    ])
}

/// Submits `plan` through the dispatcher and returns the envelope.
pub fn submit(
    harness: &mut Harness,
    plan: &PlanGraphDocument,
) -> turngate_core::ResponseEnvelope<Value> {
    let args = serde_json::json!({ "plan": serde_json::to_value(plan).expect("plan serializes") });
    harness.call(VerbName::SubmitExecutionPlan, args)
}
