//! The public entry points: full-circuit verification and repeated
//! subcircuit search. Both are blocking, single-threaded, and timed with a
//! monotonic clock.

use crate::discrepancy;
use crate::graph::{node_by_id, CircuitGraph};
use crate::isomorphism::subgraph_isomorphic;
use crate::reduce::reduce;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{info, warn};

/// The outcome of a verification run.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// True iff the two circuits are electrically equivalent.
    pub equivalent: bool,
    /// Candidate break points when not equivalent; empty otherwise.
    pub discrepant_nodes: Vec<u32>,
    /// Wall-clock seconds spent, from a monotonic clock.
    pub elapsed_seconds: f64,
}

/// Verifies that the layout graph and the schematic graph describe the
/// same circuit: both are series/parallel reduced, then tested for labeled
/// isomorphism. On failure the discrepancy locator runs on the unreduced
/// graphs.
pub fn verify(layout: &CircuitGraph, schematic: &CircuitGraph) -> Verdict {
    let start = Instant::now();
    let reduced_layout = reduce(layout);
    let reduced_schematic = reduce(schematic);
    info!(
        "Reduced layout {}/{} nodes, schematic {}/{} nodes.",
        reduced_layout.node_count(),
        layout.node_count(),
        reduced_schematic.node_count(),
        schematic.node_count(),
    );

    // Equal sizes turn the subgraph test into a full isomorphism test.
    let equivalent = reduced_layout.node_count() == reduced_schematic.node_count()
        && reduced_layout.edge_count() == reduced_schematic.edge_count()
        && subgraph_isomorphic(&reduced_layout, &reduced_schematic).is_some();

    if equivalent {
        info!("Circuits are equivalent.");
        return Verdict {
            equivalent: true,
            discrepant_nodes: vec![],
            elapsed_seconds: start.elapsed().as_secs_f64(),
        };
    }

    let discrepant_nodes = discrepancy::locate(layout, schematic);
    info!(
        "Circuits differ; {} suspect node(s).",
        discrepant_nodes.len()
    );
    Verdict {
        equivalent: false,
        discrepant_nodes,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    }
}

/// Finds every occurrence of `pattern` as an induced substructure of
/// `layout`. After each hit the matched edges are deleted (nodes stay), so
/// overlapping occurrences that share nets are each found once.
pub fn find_subcircuits(
    pattern: &CircuitGraph,
    layout: &CircuitGraph,
) -> (Vec<BTreeSet<u32>>, f64) {
    let start = Instant::now();
    let mut found: Vec<BTreeSet<u32>> = vec![];
    if pattern.node_count() == 0 || pattern.edge_count() == 0 {
        warn!("Empty pattern; nothing to search for.");
        return (found, start.elapsed().as_secs_f64());
    }

    let mut host = layout.clone();
    while let Some(mapping) = subgraph_isomorphic(pattern, &host) {
        found.push(mapping.values().copied().collect());

        for edge in pattern.edge_references() {
            let u = pattern[edge.source()].id;
            let v = pattern[edge.target()].id;
            let hu = node_by_id(&host, mapping[&u]).expect("mapped node exists");
            let hv = node_by_id(&host, mapping[&v]).expect("mapped node exists");
            let image = host
                .edges(hu)
                .find(|e| {
                    let other = if e.source() == hu { e.target() } else { e.source() };
                    other == hv && e.weight() == edge.weight()
                })
                .map(|e| e.id())
                .expect("image edge exists");
            host.remove_edge(image);
        }
    }

    info!("Found {} occurrence(s) of the pattern.", found.len());
    (found, start.elapsed().as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::build_graph;
    use lvs_cif::netlist::parse_netlist;

    #[test]
    fn test_identical_netlists_verify() {
        let a = build_graph(&parse_netlist("TP1 P in vdd out\nTN1 N in out gnd"));
        let b = build_graph(&parse_netlist("TP9 P x hi y\nTN9 N x y lo"));
        let verdict = verify(&a, &b);
        assert!(verdict.equivalent);
        assert_eq!(verdict.discrepant_nodes, Vec::<u32>::new());
        assert!(verdict.elapsed_seconds >= 0.0);
    }

    #[test]
    fn test_empty_graphs_verify() {
        let empty = CircuitGraph::default();
        assert!(verify(&empty, &empty).equivalent);
    }

    #[test]
    fn test_empty_layout_against_nonempty_netlist() {
        let empty = CircuitGraph::default();
        let schematic = build_graph(&parse_netlist("T1 N g d s"));
        assert!(!verify(&empty, &schematic).equivalent);
    }

    #[test]
    fn test_parallel_redrawing_verifies() {
        let doubled = build_graph(&parse_netlist("T1 N g d s\nT2 N g d s"));
        let single = build_graph(&parse_netlist("T1 N g d s"));
        assert!(verify(&doubled, &single).equivalent);
    }

    #[test]
    fn test_series_redrawing_verifies() {
        let stacked = build_graph(&parse_netlist("T1 N g d m\nT2 N g m s"));
        let single = build_graph(&parse_netlist("T1 N g d s"));
        assert!(verify(&stacked, &single).equivalent);
    }

    #[test]
    fn test_kind_mismatch_fails() {
        let n = build_graph(&parse_netlist("T1 N g d s"));
        let p = build_graph(&parse_netlist("T1 P g d s"));
        assert!(!verify(&n, &p).equivalent);
    }

    #[test]
    fn test_three_inverters_contain_three() {
        let pattern = build_graph(&parse_netlist("TP P in vdd out\nTN N in out gnd"));
        let chain = build_graph(&parse_netlist(
            "P1 P a vdd b\nN1 N a b gnd\n\
             P2 P b vdd c\nN2 N b c gnd\n\
             P3 P c vdd d\nN3 N c d gnd",
        ));
        let (occurrences, _elapsed) = find_subcircuits(&pattern, &chain);
        assert_eq!(occurrences.len(), 3);
        // All three node sets are distinct.
        let distinct: BTreeSet<&BTreeSet<u32>> = occurrences.iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_empty_pattern_finds_nothing() {
        let chain = build_graph(&parse_netlist("P1 P a vdd b\nN1 N a b gnd"));
        let (occurrences, _) = find_subcircuits(&CircuitGraph::default(), &chain);
        assert_eq!(occurrences, Vec::<BTreeSet<u32>>::new());
    }
}
