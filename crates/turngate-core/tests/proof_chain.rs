// turngate-core/tests/proof_chain.rs
// ============================================================================
// Module: Proof Chain Tests
// Description: Graph-backed traversal with AST fallback and explicit gaps.
// Purpose: Ensure chains are evidenced hop by hop and degradation is
//          recorded, never papered over.
// Dependencies: turngate-core
// ============================================================================

//! ## Overview
//! Covers the three regimes: a fully graph-resolved chain, a mixed chain
//! where some hops fall back to indexer evidence, and a dead graph with a
//! dead indexer where every unresolved kind lands in `missing_links`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use common::DownGraph;
use common::ScriptedGraph;
use common::StubIndexer;
use turngate_core::runtime::LinkSource;
use turngate_core::runtime::build_ag_grid_chain;
use turngate_core::runtime::build_federation_chain;

/// A graph holding the full ag-Grid origin chain for `ordersTable`.
fn full_ag_grid_graph() -> ScriptedGraph {
    ScriptedGraph::with_edges(&[
        ("ordersTable", "HAS_COLUMN", "col_status"),
        ("col_status", "USES_RENDERER", "statusRenderer"),
        ("statusRenderer", "TRIGGERS_NAV", "openOrderNav"),
        ("openOrderNav", "ROUTES_TO", "orderDetailRoute"),
        ("orderDetailRoute", "INJECTS", "OrderDetailComponent"),
        ("OrderDetailComponent", "INJECTS", "OrderService"),
        ("OrderService", "DEFINED_BY", "OrderStatusDefinition"),
    ])
}

#[test]
fn a_fully_seeded_graph_resolves_every_ag_grid_hop_from_the_graph() {
    let chain = build_ag_grid_chain(&full_ag_grid_graph(), &StubIndexer::empty(), "ordersTable");
    assert!(chain.missing_links.is_empty());
    assert_eq!(chain.links.len(), 7);
    assert!(chain.links.iter().all(|link| link.source == LinkSource::Graph));
    assert!(chain.complete());
    assert_eq!(chain.links[0].node_ref, "col_status");
    assert_eq!(chain.links[6].node_ref, "OrderStatusDefinition");
}

#[test]
fn a_partially_seeded_graph_falls_back_to_indexer_evidence_per_hop() {
    let graph = ScriptedGraph::with_edges(&[
        ("ordersTable", "HAS_COLUMN", "col_status"),
        ("col_status", "USES_RENDERER", "statusRenderer"),
    ]);
    let indexer = StubIndexer::with_files(&[
        ("src/nav.ts", "export const onClick = () => navigate('/orders/:id')"),
        ("src/routes.ts", "export const route = '/orders/:id'"),
        ("src/detail.ts", "// the order detail component\nexport class OrderDetailComponent {}"),
        ("src/order.ts", "// the order service\nexport class OrderService {}"),
        ("src/status.ts", "export interface OrderStatusDefinition {}"),
    ]);
    let chain = build_ag_grid_chain(&graph, &indexer, "ordersTable");
    assert!(chain.missing_links.is_empty());
    assert!(chain.complete());
    assert_eq!(chain.links[0].source, LinkSource::Graph);
    assert_eq!(chain.links[1].source, LinkSource::Graph);
    assert!(chain.links[2..].iter().all(|link| link.source == LinkSource::AstFallback));
}

#[test]
fn a_dead_graph_and_empty_index_yield_explicit_missing_links() {
    let chain = build_ag_grid_chain(&DownGraph, &StubIndexer::empty(), "ordersTable");
    assert!(chain.links.is_empty());
    assert_eq!(chain.missing_links.len(), 7);
    assert!(!chain.complete());
}

#[test]
fn the_federation_chain_follows_its_own_edge_kinds() {
    let graph = ScriptedGraph::with_edges(&[
        ("hostOrdersRoute", "LOADS_REMOTE", "ordersRemoteEntry"),
        ("ordersRemoteEntry", "EXPOSES", "ordersModule"),
        ("ordersModule", "ROUTES_TO", "remoteOrdersRoute"),
        ("remoteOrdersRoute", "ROUTES_TO", "RemoteOrdersComponent"),
    ]);
    let chain = build_federation_chain(&graph, &StubIndexer::empty(), "hostOrdersRoute");
    assert!(chain.missing_links.is_empty());
    assert_eq!(chain.links.len(), 4);
    assert!(chain.complete());
    assert_eq!(chain.links[3].node_ref, "RemoteOrdersComponent");
}

#[test]
fn a_single_resolved_link_is_not_enough_for_completeness() {
    let graph = ScriptedGraph::with_edges(&[("hostOrdersRoute", "LOADS_REMOTE", "ordersRemoteEntry")]);
    let chain = build_federation_chain(&graph, &StubIndexer::empty(), "hostOrdersRoute");
    assert_eq!(chain.links.len(), 1);
    assert!(!chain.missing_links.is_empty());
    assert!(!chain.complete());
}
