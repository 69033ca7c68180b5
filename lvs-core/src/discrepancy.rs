//! Locates candidate break points when verification fails: a degree-census
//! diff marks the suspects, and trial deletion finds the first one whose
//! removal lets the rest of the circuit match.

use crate::graph::{degree_histogram, CircuitGraph};
use crate::isomorphism::subgraph_isomorphic;
use crate::reduce::reduce;
use petgraph::stable_graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Compares degree histograms and trial-deletes surplus nodes. Returns the
/// suspected break points: the nodes on the opposite side left out of the
/// first successful mapping. Empty when no single-node fix exists.
pub fn locate(layout: &CircuitGraph, schematic: &CircuitGraph) -> Vec<u32> {
    let layout_histogram = degree_histogram(layout);
    let schematic_histogram = degree_histogram(schematic);

    let mut delta: BTreeMap<usize, i64> = BTreeMap::new();
    for (d, count) in &schematic_histogram {
        *delta.entry(*d).or_insert(0) += *count as i64;
    }
    for (d, count) in &layout_histogram {
        *delta.entry(*d).or_insert(0) -= *count as i64;
    }
    debug!("Degree census delta: {:?}", delta);

    let schematic_candidates = candidates(schematic, &delta, 1);
    let layout_candidates = candidates(layout, &delta, -1);
    if schematic_candidates.is_empty() && layout_candidates.is_empty() {
        info!("Identical degree censuses; no single-node suspect.");
        return vec![];
    }

    // Search the side with fewer candidates. On a tie, trial-delete on the
    // schematic side so the reported suspects are layout nodes.
    if !layout_candidates.is_empty()
        && (schematic_candidates.is_empty() || layout_candidates.len() < schematic_candidates.len())
    {
        trial_deletion(layout, layout_candidates, schematic)
    } else {
        trial_deletion(schematic, schematic_candidates, layout)
    }
}

// Nodes whose degree is over-represented on this side, cheapest (lowest
// degree) first.
fn candidates(graph: &CircuitGraph, delta: &BTreeMap<usize, i64>, sign: i64) -> Vec<NodeIndex> {
    let mut found: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|ix| {
            let d = graph.edges(*ix).count();
            delta.get(&d).map_or(false, |v| v.signum() == sign)
        })
        .collect();
    found.sort_by_key(|ix| (graph.edges(*ix).count(), graph[*ix].id));
    found
}

fn trial_deletion(
    side: &CircuitGraph,
    candidates: Vec<NodeIndex>,
    other: &CircuitGraph,
) -> Vec<u32> {
    let reduced_other = reduce(other);
    for candidate in candidates {
        debug!("Trial-deleting node {}.", side[candidate].name);
        let mut trimmed = side.clone();
        trimmed.remove_node(candidate);
        let reduced_trimmed = reduce(&trimmed);
        let Some(mapping) = subgraph_isomorphic(&reduced_trimmed, &reduced_other) else {
            continue;
        };

        let image: BTreeSet<u32> = mapping.values().copied().collect();
        let mut missing: Vec<u32> = reduced_other
            .node_weights()
            .map(|info| info.id)
            .filter(|id| !image.contains(id))
            .collect();
        missing.sort_unstable();
        info!(
            "Deleting {} makes the rest match; {} opposite-side suspects.",
            side[candidate].name,
            missing.len()
        );
        return missing;
    }
    info!("No trial deletion produced a match.");
    vec![]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::build_graph;
    use lvs_cif::netlist::parse_netlist;

    #[test]
    fn test_identical_graphs_have_no_suspects() {
        let g = build_graph(&parse_netlist("TP1 P in vdd out\nTN1 N in out gnd"));
        assert_eq!(locate(&g, &g), Vec::<u32>::new());
    }

    #[test]
    fn test_missing_terminal_edge() {
        // The layout lost one terminal edge (a broken contact): its device
        // has degree 2, its drain net is orphaned at degree 0.
        let schematic = build_graph(&parse_netlist("T1 N g d s"));
        let mut layout = build_graph(&parse_netlist("T1 N g d s"));
        let edge = layout
            .edge_indices()
            .find(|e| {
                let (a, b) = layout.edge_endpoints(*e).unwrap();
                layout[a].name == "d" || layout[b].name == "d"
            })
            .unwrap();
        layout.remove_edge(edge);

        let suspects = locate(&layout, &schematic);
        // The orphaned layout net deletes first (degree 0), and the
        // matching leaves exactly one schematic terminal net unused.
        assert_eq!(suspects.len(), 1);
        let name = &schematic[crate::graph::node_by_id(&schematic, suspects[0]).unwrap()].name;
        assert!(name == "d" || name == "s");
    }

    #[test]
    fn test_whole_missing_device_has_no_single_node_fix() {
        // The schematic has an entire device (four nodes) the layout
        // lacks; no single trial deletion can reconcile that.
        let schematic = build_graph(&parse_netlist("T1 N g d s\nT2 P g2 d2 s2"));
        let layout = build_graph(&parse_netlist("T1 N g d s"));
        assert_eq!(locate(&layout, &schematic), Vec::<u32>::new());
    }
}
