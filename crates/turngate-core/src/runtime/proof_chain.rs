// turngate-core/src/runtime/proof_chain.rs
// ============================================================================
// Module: Proof-Chain Builder
// Description: Follows typed graph edges to build an evidenced link chain
//              for the ag-Grid origin and federation reference shapes, with
//              an indexer-backed fallback when the graph cannot resolve a hop.
// Purpose: Give `trace_symbol_graph` and evidence checks a chain the agent
//          can cite, instead of an unverified guess.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! Follows typed graph edges to build an evidenced link chain, with an indexer-backed fallback when the graph cannot resolve a hop.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::interfaces::GraphClient;
use crate::interfaces::Indexer;

/// The ag-Grid origin chain's expected link kinds, in traversal order.
pub const AG_GRID_CHAIN: [&str; 7] = [
    "ColumnDef",
    "CellRenderer",
    "NavTrigger",
    "Route",
    "Component",
    "Service",
    "Definition",
];

/// The federation chain's expected link kinds, in traversal order.
pub const FEDERATION_CHAIN: [&str; 4] = [
    "FederationMapping",
    "RemoteExpose",
    "RemoteRoute",
    "DestinationComponent",
];

const AG_GRID_EDGES: [&str; 7] = [
    "HAS_COLUMN",
    "USES_RENDERER",
    "TRIGGERS_NAV",
    "ROUTES_TO",
    "INJECTS",
    "INJECTS",
    "DEFINED_BY",
];
const FEDERATION_EDGES: [&str; 4] = ["LOADS_REMOTE", "EXPOSES", "ROUTES_TO", "ROUTES_TO"];

/// The minimum number of links a chain must gather before it can be
/// considered complete, even with zero missing links.
const MIN_COMPLETE_LINK_COUNT: usize = 2;

/// A single evidenced hop in a proof chain.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChainLink {
    /// The expected link kind this hop satisfies.
    pub kind: String,
    /// The node id or fallback symbol this hop resolved to.
    pub node_ref: String,
    /// Whether this link came from the graph or the AST fallback.
    pub source: LinkSource,
}

/// Where a chain link's evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    /// Resolved via a typed graph edge traversal.
    Graph,
    /// Resolved via the indexer's symbol search, kind-hinted.
    AstFallback,
}

/// The result of building a proof chain: links found and kinds missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProofChain {
    /// Links resolved in traversal order.
    pub links: Vec<ChainLink>,
    /// Expected kinds that could not be resolved by either the graph or the
    /// AST fallback.
    pub missing_links: Vec<String>,
}

impl ProofChain {
    /// A chain is complete only when nothing is missing and a minimum link
    /// count was still met, so an empty seed cannot claim completeness.
    #[must_use]
    pub fn complete(&self) -> bool {
        self.missing_links.is_empty() && self.links.len() >= MIN_COMPLETE_LINK_COUNT
    }
}

fn kind_hint_substrings(kind: &str) -> Vec<String> {
    match kind {
        "ColumnDef" => vec!["columndef".to_owned(), "column".to_owned()],
        "CellRenderer" => vec!["cellrenderer".to_owned(), "renderer".to_owned()],
        "NavTrigger" => vec![
            "navtrigger".to_owned(),
            "onclick".to_owned(),
            "navigate".to_owned(),
        ],
        "Route" | "RemoteRoute" => vec!["route".to_owned()],
        "Component" | "DestinationComponent" => vec!["component".to_owned()],
        "Service" => vec!["service".to_owned()],
        "Definition" => vec!["definition".to_owned(), "interface".to_owned()],
        "FederationMapping" => vec!["federation".to_owned(), "remoteentry".to_owned()],
        "RemoteExpose" => vec!["expose".to_owned(), "loadremotemodule".to_owned()],
        _ => vec![kind.to_owned()],
    }
}

fn ast_fallback_link(indexer: &dyn Indexer, kind: &str) -> Option<ChainLink> {
    for hint in kind_hint_substrings(kind) {
        if let Ok(matches) = indexer.search_lexical(&hint, 1) {
            if let Some(hit) = matches.into_iter().next() {
                return Some(ChainLink {
                    kind: kind.to_owned(),
                    node_ref: format!("{}:{}", hit.file, hit.line),
                    source: LinkSource::AstFallback,
                });
            }
        }
    }
    None
}

fn graph_hop(
    graph: &dyn GraphClient,
    from_node: &str,
    edge_kind: &str,
) -> Option<String> {
    let mut params = BTreeMap::new();
    params.insert("from".to_owned(), Value::String(from_node.to_owned()));
    params.insert("edge".to_owned(), Value::String(edge_kind.to_owned()));
    let rows = graph.run_read("MATCH (a)-[e]->(b) WHERE a.id = $from AND e.kind = $edge RETURN b", &params).ok()?;
    rows.into_iter()
        .next()
        .and_then(|row| row.get("id").and_then(Value::as_str).map(str::to_owned))
}

fn build_chain(
    graph: &dyn GraphClient,
    indexer: &dyn Indexer,
    seed: &str,
    kinds: &[&str],
    edges: &[&str],
) -> ProofChain {
    let mut chain = ProofChain::default();
    let mut current = seed.to_owned();

    for (kind, edge) in kinds.iter().zip(edges.iter()) {
        match graph_hop(graph, &current, edge) {
            Some(next) => {
                chain.links.push(ChainLink {
                    kind: (*kind).to_owned(),
                    node_ref: next.clone(),
                    source: LinkSource::Graph,
                });
                current = next;
            }
            None => match ast_fallback_link(indexer, kind) {
                Some(link) => {
                    current = link.node_ref.clone();
                    chain.links.push(link);
                }
                None => chain.missing_links.push((*kind).to_owned()),
            },
        }
    }

    chain
}

/// Builds the ag-Grid origin chain starting from a substring match on
/// `seed_table`.
///
/// Never fabricates a link it cannot evidence; unresolved kinds are recorded
/// in [`ProofChain::missing_links`] rather than silently skipped.
#[must_use]
pub fn build_ag_grid_chain(graph: &dyn GraphClient, indexer: &dyn Indexer, seed_table: &str) -> ProofChain {
    build_chain(graph, indexer, seed_table, &AG_GRID_CHAIN, &AG_GRID_EDGES)
}

/// Builds the federation reference chain starting from a substring match on
/// `seed_host_route`.
#[must_use]
pub fn build_federation_chain(
    graph: &dyn GraphClient,
    indexer: &dyn Indexer,
    seed_host_route: &str,
) -> ProofChain {
    build_chain(graph, indexer, seed_host_route, &FEDERATION_CHAIN, &FEDERATION_EDGES)
}
