//! Labeled (sub)graph matching: a VF2-style backtracking search over
//! circuit graphs, with node-label and edge-label constraints.
//!
//! Two entry points: [`subgraph_isomorphic`] demands an induced match (no
//! extra host edges among the mapped nodes), [`subgraph_monomorphic`]
//! allows them. Both return the node mapping by stable id.

use crate::graph::{CircuitGraph, EdgeKind, NodeKind};
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet};

/// A match: pattern node id → host node id.
pub type Mapping = BTreeMap<u32, u32>;

/// Finds an induced subgraph of `host` isomorphic to `pattern`.
pub fn subgraph_isomorphic(pattern: &CircuitGraph, host: &CircuitGraph) -> Option<Mapping> {
    search(pattern, host, true)
}

/// Finds a (not necessarily induced) subgraph of `host` that `pattern`
/// maps into: the host may have additional edges among the mapped nodes.
pub fn subgraph_monomorphic(pattern: &CircuitGraph, host: &CircuitGraph) -> Option<Mapping> {
    search(pattern, host, false)
}

fn degree(g: &CircuitGraph, ix: NodeIndex) -> usize {
    g.edges(ix).count()
}

// Multiplicity of edges between a and b, per edge label.
fn edge_counts(g: &CircuitGraph, a: NodeIndex, b: NodeIndex) -> [usize; 2] {
    let mut counts = [0, 0];
    for edge in g.edges(a) {
        let other = if edge.source() == a {
            edge.target()
        } else {
            edge.source()
        };
        if other == b {
            match edge.weight() {
                EdgeKind::Terminal => counts[0] += 1,
                EdgeKind::Gate => counts[1] += 1,
            }
        }
    }
    counts
}

fn label_counts(g: &CircuitGraph) -> BTreeMap<NodeKind, usize> {
    let mut counts = BTreeMap::new();
    for info in g.node_weights() {
        *counts.entry(info.kind).or_insert(0) += 1;
    }
    counts
}

// Orders pattern nodes for connected expansion: each next node is the one
// with the most already-ordered neighbors, ties broken by degree then id.
fn matching_order(pattern: &CircuitGraph) -> Vec<NodeIndex> {
    let mut order: Vec<NodeIndex> = vec![];
    let mut placed: BTreeSet<NodeIndex> = BTreeSet::new();
    while placed.len() < pattern.node_count() {
        let next = pattern
            .node_indices()
            .filter(|ix| !placed.contains(ix))
            .max_by_key(|ix| {
                let anchored = pattern
                    .edges(*ix)
                    .filter(|e| {
                        let other = if e.source() == *ix { e.target() } else { e.source() };
                        placed.contains(&other)
                    })
                    .count();
                // Ids descend in the key so the smallest id wins ties.
                (anchored, degree(pattern, *ix), std::cmp::Reverse(pattern[*ix].id))
            })
            .expect("unplaced node remains");
        placed.insert(next);
        order.push(next);
    }
    order
}

struct Search<'a> {
    pattern: &'a CircuitGraph,
    host: &'a CircuitGraph,
    induced: bool,
    order: Vec<NodeIndex>,
    host_nodes: Vec<NodeIndex>,
    assigned: Vec<Option<NodeIndex>>,
    used: BTreeSet<NodeIndex>,
}

impl Search<'_> {
    fn feasible(&self, pos: usize, candidate: NodeIndex) -> bool {
        let p = self.order[pos];
        if self.pattern[p].kind != self.host[candidate].kind {
            return false;
        }
        if degree(self.host, candidate) < degree(self.pattern, p) {
            return false;
        }
        for (q_pos, assignment) in self.assigned.iter().enumerate().take(pos) {
            let q = self.order[q_pos];
            let image = assignment.expect("earlier positions are assigned");
            let wanted = edge_counts(self.pattern, p, q);
            let got = edge_counts(self.host, candidate, image);
            let ok = if self.induced {
                wanted == got
            } else {
                wanted[0] <= got[0] && wanted[1] <= got[1]
            };
            if !ok {
                return false;
            }
        }
        true
    }

    fn extend(&mut self, pos: usize) -> bool {
        if pos == self.order.len() {
            return true;
        }
        for h_ix in 0..self.host_nodes.len() {
            let candidate = self.host_nodes[h_ix];
            if self.used.contains(&candidate) || !self.feasible(pos, candidate) {
                continue;
            }
            self.assigned[pos] = Some(candidate);
            self.used.insert(candidate);
            if self.extend(pos + 1) {
                return true;
            }
            self.assigned[pos] = None;
            self.used.remove(&candidate);
        }
        false
    }
}

fn search(pattern: &CircuitGraph, host: &CircuitGraph, induced: bool) -> Option<Mapping> {
    if pattern.node_count() > host.node_count() || pattern.edge_count() > host.edge_count() {
        return None;
    }
    let host_labels = label_counts(host);
    for (kind, count) in label_counts(pattern) {
        if host_labels.get(&kind).copied().unwrap_or(0) < count {
            return None;
        }
    }

    let order = matching_order(pattern);
    let mut host_nodes: Vec<NodeIndex> = host.node_indices().collect();
    host_nodes.sort_by_key(|ix| host[*ix].id);

    let mut state = Search {
        pattern,
        host,
        induced,
        assigned: vec![None; order.len()],
        order,
        host_nodes,
        used: BTreeSet::new(),
    };
    if !state.extend(0) {
        return None;
    }

    let mut mapping = Mapping::new();
    for (pos, assignment) in state.assigned.iter().enumerate() {
        let p = state.order[pos];
        let h = assignment.expect("search completed");
        mapping.insert(pattern[p].id, host[h].id);
    }
    Some(mapping)
}
