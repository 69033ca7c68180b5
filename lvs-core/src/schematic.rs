//! Builds a circuit graph from netlist records, with the same labeling
//! discipline as layout extraction: transistors labeled by channel kind,
//! nets labeled `bus`, edges labeled `terminal` or `gate`.

use crate::graph::{CircuitGraph, EdgeKind, NodeInfo, NodeKind};
use lvs_cif::netlist::NetlistRecord;
use petgraph::stable_graph::NodeIndex;
use std::collections::BTreeMap;
use tracing::info;

/// Builds the schematic graph. Each distinct net name becomes one bus
/// node on first mention; a transistor with identical drain and source
/// names gets two parallel terminal edges to the same bus.
pub fn build_graph(records: &[NetlistRecord]) -> CircuitGraph {
    let mut graph = CircuitGraph::default();
    let mut id_counter: u32 = 0;
    let mut nets: BTreeMap<String, NodeIndex> = BTreeMap::new();

    for record in records {
        let t_ix = graph.add_node(NodeInfo {
            id: id_counter,
            name: record.name.clone(),
            kind: record.kind.into(),
        });
        id_counter += 1;

        for (name, kind) in [
            (&record.drain, EdgeKind::Terminal),
            (&record.source, EdgeKind::Terminal),
            (&record.gate, EdgeKind::Gate),
        ] {
            let n_ix = match nets.get(name) {
                Some(ix) => *ix,
                None => {
                    let ix = graph.add_node(NodeInfo {
                        id: id_counter,
                        name: name.clone(),
                        kind: NodeKind::Bus,
                    });
                    id_counter += 1;
                    nets.insert(name.clone(), ix);
                    ix
                }
            };
            graph.add_edge(t_ix, n_ix, kind);
        }
    }

    info!(
        "Schematic graph: {} nodes, {} edges.",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvs_cif::netlist::parse_netlist;

    #[test]
    fn test_single_transistor() {
        let graph = build_graph(&parse_netlist("T1 N g d s"));
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_shared_nets_are_one_node() {
        // A CMOS inverter: both gates on `in`, both drains on `out`.
        let graph = build_graph(&parse_netlist("TP1 P in vdd out\nTN1 N in out gnd"));
        assert_eq!(graph.node_count(), 6); // 2 devices + in, vdd, out, gnd
        assert_eq!(graph.edge_count(), 6);
    }

    #[test]
    fn test_identical_drain_and_source() {
        let graph = build_graph(&parse_netlist("T1 N g x x"));
        assert_eq!(graph.node_count(), 3);
        // Both terminal edges survive, in parallel.
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_empty_netlist() {
        let graph = build_graph(&[]);
        assert_eq!(graph.node_count(), 0);
    }
}
