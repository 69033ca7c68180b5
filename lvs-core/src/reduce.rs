//! Series/parallel reduction: collapses harmless redrawings of same-kind
//! transistor groups so the two graphs present the isomorphism engine with
//! the same canonical shape.
//!
//! Two devices drawn in parallel (same three neighbors, same edge labels)
//! are one device; a stack of same-kind devices chained through plain
//! degree-2 wire nets is one device. Both rules run to fixpoint, parallel
//! before series in each round.

use crate::graph::{CircuitGraph, EdgeKind, NodeKind};
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// Reduces a graph to its series/parallel canonical form. The input is
/// untouched; the result reuses the surviving nodes' ids (each collapsed
/// group keeps its smallest transistor id), so reduction is idempotent up
/// to id renaming and, here, literally.
pub fn reduce(graph: &CircuitGraph) -> CircuitGraph {
    let mut g = graph.clone();
    loop {
        let mut changed = false;
        // Parallel goes first in each round: a parallel pair shares two
        // degree-2 nets, and letting the series walk swallow those first
        // would collapse the pair into a two-terminal blob instead.
        while collapse_one_parallel(&mut g) {
            changed = true;
        }
        while collapse_one_series(&mut g) {
            changed = true;
        }
        if !changed {
            break;
        }
    }
    g
}

fn degree(g: &CircuitGraph, ix: NodeIndex) -> usize {
    g.edges(ix).count()
}

fn other_endpoint(g: &CircuitGraph, edge: petgraph::stable_graph::EdgeIndex, ix: NodeIndex) -> NodeIndex {
    let (a, b) = g.edge_endpoints(edge).expect("edge exists");
    if a == ix {
        b
    } else {
        a
    }
}

// One round of the parallel rule: finds one class of degree-3 transistors
// with identical kind and identical (neighbor, label) multisets, and
// replaces it with its smallest-id member.
fn collapse_one_parallel(g: &mut CircuitGraph) -> bool {
    let mut groups: BTreeMap<(NodeKind, Vec<(NodeIndex, EdgeKind)>), Vec<NodeIndex>> =
        BTreeMap::new();
    for ix in g.node_indices() {
        if !g[ix].kind.is_transistor() || degree(g, ix) != 3 {
            continue;
        }
        let mut incident: Vec<(NodeIndex, EdgeKind)> = g
            .edges(ix)
            .map(|e| (other_endpoint(g, e.id(), ix), *e.weight()))
            .collect();
        incident.sort();
        groups.entry((g[ix].kind, incident)).or_default().push(ix);
    }

    for ((_, incident), mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by_key(|ix| g[*ix].id);
        let rep = members[0];
        debug!(
            "Parallel collapse of {} devices into {}.",
            members.len(),
            g[rep].name
        );
        for other in &members[1..] {
            g.remove_node(*other);
        }
        // The representative keeps one edge per distinct neighbor.
        let stale: Vec<_> = g.edges(rep).map(|e| e.id()).collect();
        for edge in stale {
            g.remove_edge(edge);
        }
        let mut distinct = incident;
        distinct.dedup();
        for (nb, kind) in distinct {
            g.add_edge(rep, nb, kind);
        }
        return true;
    }
    false
}

// One round of the series rule: grows a component from a degree-3
// transistor through same-kind degree-3 transistors and non-gate degree-2
// nets, and collapses it if it holds at least two devices.
fn collapse_one_series(g: &mut CircuitGraph) -> bool {
    let seeds: Vec<NodeIndex> = g
        .node_indices()
        .filter(|ix| g[*ix].kind.is_transistor() && degree(g, *ix) == 3)
        .collect();

    for seed in seeds {
        let kind = g[seed].kind;
        let mut component: BTreeSet<NodeIndex> = BTreeSet::from([seed]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([seed]);
        while let Some(cur) = queue.pop_front() {
            for edge in g.edges(cur) {
                let nb = other_endpoint(g, edge.id(), cur);
                if component.contains(&nb) {
                    continue;
                }
                let admit = match g[nb].kind {
                    k if k == kind => degree(g, nb) == 3,
                    NodeKind::Bus => {
                        // A degree-2 net reached over a gate edge is a
                        // fanout boundary, not a wire pass-through.
                        degree(g, nb) == 2 && *edge.weight() != EdgeKind::Gate
                    }
                    _ => false,
                };
                if admit {
                    component.insert(nb);
                    queue.push_back(nb);
                }
            }
        }

        let transistors: Vec<NodeIndex> = component
            .iter()
            .copied()
            .filter(|ix| g[*ix].kind.is_transistor())
            .collect();
        if transistors.len() < 2 {
            continue;
        }

        let rep_info = transistors
            .iter()
            .map(|ix| g[*ix].clone())
            .min_by_key(|info| info.id)
            .expect("at least two devices");
        debug!(
            "Series collapse of {} nodes into {}.",
            component.len(),
            rep_info.name
        );

        let mut external: BTreeSet<(NodeIndex, EdgeKind)> = BTreeSet::new();
        for &member in &component {
            for edge in g.edges(member) {
                let nb = other_endpoint(g, edge.id(), member);
                if !component.contains(&nb) {
                    external.insert((nb, *edge.weight()));
                }
            }
        }

        for &member in &component {
            g.remove_node(member);
        }
        let new_ix = g.add_node(rep_info);
        for (nb, kind) in external {
            g.add_edge(new_ix, nb, kind);
        }
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{to_json, NodeInfo};
    use crate::schematic::build_graph;
    use lvs_cif::netlist::parse_netlist;
    use pretty_assertions::assert_eq;

    fn label_multiset(g: &CircuitGraph) -> Vec<NodeKind> {
        let mut kinds: Vec<NodeKind> = g.node_weights().map(|info| info.kind).collect();
        kinds.sort();
        kinds
    }

    #[test]
    fn test_parallel_pair_collapses() {
        // Two identical devices across the same three nets.
        let g = build_graph(&parse_netlist("T1 N g d s\nT2 N g d s"));
        let reduced = reduce(&g);
        assert_eq!(reduced.node_count(), 4); // one device + g, d, s
        assert_eq!(
            label_multiset(&reduced),
            vec![NodeKind::N, NodeKind::Bus, NodeKind::Bus, NodeKind::Bus]
        );
    }

    #[test]
    fn test_parallel_requires_same_kind() {
        let g = build_graph(&parse_netlist("T1 N g d s\nT2 P g d s"));
        assert_eq!(reduce(&g).node_count(), 5);
    }

    #[test]
    fn test_parallel_requires_same_edge_labels() {
        // T1 and T2 share the neighbor set {g, d, s}, but T2 gates on d
        // where T1 gates on g. The extra P devices hold every shared net at
        // degree 3 so the series walk cannot pass through either.
        let g = build_graph(&parse_netlist(
            "T1 N g d s\nT2 N d g s\nT3 P g q r\nT4 P d u v\nT5 P s w z",
        ));
        let reduced = reduce(&g);
        assert_eq!(reduced.node_count(), g.node_count());
        assert_eq!(reduced.edge_count(), g.edge_count());
    }

    #[test]
    fn test_series_stack_collapses() {
        // Two devices chained through the internal net m, which has
        // degree 2 and only terminal edges.
        let g = build_graph(&parse_netlist("T1 N g d m\nT2 N g m s"));
        let reduced = reduce(&g);
        // m vanishes into the stack; the pair becomes one device with
        // terminal edges to d and s and a gate edge to g.
        assert_eq!(
            label_multiset(&reduced),
            vec![NodeKind::N, NodeKind::Bus, NodeKind::Bus, NodeKind::Bus]
        );
        let device = reduced
            .node_indices()
            .find(|ix| reduced[*ix].kind.is_transistor())
            .unwrap();
        assert_eq!(reduced.edges(device).count(), 3);
    }

    #[test]
    fn test_gate_fanout_net_is_a_boundary() {
        // The shared net m has degree 2, but both of its edges are gate
        // edges: it is a fanout, not a wire pass-through, so nothing
        // collapses across it.
        let g = build_graph(&parse_netlist("T1 N m d s\nT2 N m a b"));
        let reduced = reduce(&g);
        assert_eq!(reduced.node_count(), g.node_count());
        assert_eq!(reduced.edge_count(), g.edge_count());
    }

    #[test]
    fn test_reduction_is_idempotent() {
        for netlist in [
            "T1 N g d s\nT2 N g d s\nT3 N g d s",
            "T1 N g d m\nT2 N g m s",
            "TP1 P in vdd out\nTN1 N in out gnd",
        ] {
            let g = build_graph(&parse_netlist(netlist));
            let once = reduce(&g);
            let twice = reduce(&once);
            assert_eq!(to_json(&once), to_json(&twice));
        }
    }

    #[test]
    fn test_inverter_is_untouched() {
        let g = build_graph(&parse_netlist("TP1 P in vdd out\nTN1 N in out gnd"));
        let reduced = reduce(&g);
        assert_eq!(reduced.node_count(), 6);
        assert_eq!(reduced.edge_count(), 6);
    }

    #[test]
    fn test_representative_keeps_smallest_id() {
        let g = build_graph(&parse_netlist("T1 N g d s\nT2 N g d s"));
        let reduced = reduce(&g);
        let device = reduced
            .node_indices()
            .find(|ix| reduced[*ix].kind.is_transistor())
            .unwrap();
        let info: &NodeInfo = &reduced[device];
        assert_eq!(info.id, 0);
        assert_eq!(info.name, "T1");
    }
}
