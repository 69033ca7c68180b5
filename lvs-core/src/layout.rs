//! Extracts a circuit graph from a mask layout.
//!
//! Extraction runs as a fixed sequence of passes over the layer store:
//! transistor discovery (gate strips carving active areas), contact
//! discovery, net discovery, gate unification, same-layer net merging, and
//! the wiring passes that populate the id-sets. A second stage of
//! absorption rules then collapses contacts and equipotential nets until
//! only transistors and visible nets remain, and those become the graph.

use crate::{
    contact::{Contact, CONTACT_FAMILIES},
    graph::{CircuitGraph, NodeInfo, NodeKind},
    layers::LayerStore,
    net::Net,
    transistor::Transistor,
};
use itertools::Itertools;
use lvs_cif::netlist::Kind;
use lvs_geometry::{boolean::split_by_cut, polygon::Polygon};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// A circuit being extracted from a layout. Owns every layer, transistor,
/// contact, and net it discovers; all cross-references are ids.
#[derive(Debug, Default)]
pub struct LayoutCircuit {
    layers: LayerStore,
    /// The discovered transistors.
    pub transistors: Vec<Transistor>,
    /// The discovered contacts.
    pub contacts: Vec<Contact>,
    /// The discovered nets.
    pub nets: Vec<Net>,
    id_counter: u32,
    merged: bool,
}

impl LayoutCircuit {
    /// Builds a circuit from parsed `(layer_name, polygon)` records and
    /// runs all extraction passes.
    pub fn from_records(records: Vec<(String, Polygon)>) -> LayoutCircuit {
        let mut layers = LayerStore::new();
        for (layer, polygon) in records {
            layers.add(&layer, polygon);
        }
        layers.dedup();

        let mut circuit = LayoutCircuit {
            layers,
            ..LayoutCircuit::default()
        };
        circuit.discover_transistors();
        circuit.discover_contacts();
        circuit.discover_nets();
        circuit.unify_gate_nets();
        circuit.merge_same_layer_nets();
        circuit.wire_contacts_to_nets();
        circuit.wire_transistors_to_contacts();
        circuit.synthesize_junction_nets();
        circuit.attach_gate_edges();
        info!(
            "Extracted {} transistors, {} contacts, {} nets.",
            circuit.transistors.len(),
            circuit.contacts.len(),
            circuit.nets.len()
        );
        circuit
    }

    fn next_id(&mut self) -> u32 {
        let id = self.id_counter;
        self.id_counter += 1;
        id
    }

    // A gate polygon crossing an active area splits it in two and leaves a
    // device behind. Pieces go back into the pool so a later gate can split
    // them again (stacked devices); terminal regions of already-emitted
    // devices narrow along with their pieces.
    fn discover_transistors(&mut self) {
        for (gate_layer, kind) in [("SN", Kind::N), ("SP", Kind::P)] {
            let Some(gates) = self.layers.find(gate_layer).map(|g| g.to_vec()) else {
                continue;
            };
            let Some(mut active) = self.layers.find("NA").map(|a| a.to_vec()) else {
                continue;
            };

            for gate in &gates {
                let mut i = 0;
                while i < active.len() {
                    if !gate.intersects(&active[i]) {
                        i += 1;
                        continue;
                    }
                    let (drain, source) = match split_by_cut(&active[i], gate) {
                        Ok(pieces) => pieces,
                        Err(err) => {
                            warn!("Skipping device candidate on {}: {}", gate_layer, err);
                            i += 1;
                            continue;
                        }
                    };
                    let replaced = active.remove(i);
                    self.narrow_terminals(&replaced, &drain, &source);
                    let id = self.next_id();
                    debug!("Device {} ({}) under gate {:?}.", id, kind, gate.min_vertex());
                    self.transistors.push(Transistor::new(
                        id,
                        kind,
                        gate.clone(),
                        drain.clone(),
                        source.clone(),
                    ));
                    active.push(drain);
                    active.push(source);
                }
            }
            self.layers.replace("NA", active);
        }
    }

    // When a split consumes a piece that is already some device's terminal
    // region, that terminal shrinks to the sub-piece still adjacent to its
    // own gate. Keeping terminals current is what lets junction detection
    // compare present-day geometry instead of stale pre-split regions.
    fn narrow_terminals(&mut self, replaced: &Polygon, drain: &Polygon, source: &Polygon) {
        for trans in &mut self.transistors {
            for slot in [&mut trans.drain, &mut trans.source] {
                if &*slot != replaced {
                    continue;
                }
                if drain.touches(&trans.gate) {
                    *slot = drain.clone();
                } else if source.touches(&trans.gate) {
                    *slot = source.clone();
                }
            }
        }
    }

    // Six contact families, each a (window layer, enclosing layer, upper
    // layer) triple. One contact per window, on the first enclosing/upper
    // pair that satisfies the family's rule.
    fn discover_contacts(&mut self) {
        for family in CONTACT_FAMILIES {
            let Some(windows) = self.layers.find(family.contact_layer).map(|w| w.to_vec()) else {
                continue;
            };
            let (Some(enclosings), Some(uppers)) = (
                self.layers.find(family.enclosing_layer).map(|e| e.to_vec()),
                self.layers.find(family.upper_layer).map(|u| u.to_vec()),
            ) else {
                warn!(
                    "Contact layer {} present but {} or {} missing; no {} contacts emitted.",
                    family.contact_layer,
                    family.enclosing_layer,
                    family.upper_layer,
                    family.tag
                );
                continue;
            };

            'windows: for window in &windows {
                for enclosing in &enclosings {
                    if !window.intersects(enclosing) {
                        continue;
                    }
                    for upper in &uppers {
                        let satisfied = if family.equipotential {
                            upper.intersects(enclosing)
                        } else {
                            upper == enclosing
                        };
                        if satisfied {
                            let id = self.next_id();
                            self.contacts.push(Contact {
                                id,
                                tag: family.tag,
                                lower_layer: family.enclosing_layer,
                                upper_layer: family.upper_layer,
                                window: window.clone(),
                                enclosing: enclosing.clone(),
                                adjacent: BTreeSet::new(),
                            });
                            continue 'windows;
                        }
                    }
                }
            }
        }
    }

    // Every routing-layer polygon becomes a single-polygon net, except the
    // landing pads that exist only to enclose a contact.
    fn discover_nets(&mut self) {
        for layer in ["M1", "M2", "SI"] {
            let Some(polygons) = self.layers.find(layer).map(|p| p.to_vec()) else {
                continue;
            };
            for polygon in polygons {
                let is_enclosing = self
                    .contacts
                    .iter()
                    .any(|c| c.lower_layer == layer && c.enclosing == polygon);
                if is_enclosing {
                    continue;
                }
                let id = self.next_id();
                self.nets.push(Net::new(id, layer, vec![polygon]));
            }
        }
    }

    // Pulls each gate polygon into the SI net that touches it; several SI
    // nets touching one gate are really one conductor and unite.
    fn unify_gate_nets(&mut self) {
        for t_ix in 0..self.transistors.len() {
            let gate = self.transistors[t_ix].gate.clone();
            let touching: Vec<u32> = self
                .nets
                .iter()
                .filter(|n| n.layer == "SI" && n.touches(&gate))
                .map(|n| n.id)
                .collect();
            let Some((&target_id, rest)) = touching.split_first() else {
                continue;
            };

            let mut absorbed = vec![];
            self.nets.retain_mut(|n| {
                if rest.contains(&n.id) {
                    absorbed.append(&mut n.polygons);
                    false
                } else {
                    true
                }
            });
            let target = self
                .nets
                .iter_mut()
                .find(|n| n.id == target_id)
                .expect("uniting net is still present");
            target.polygons.push(gate.clone());
            target.polygons.extend(absorbed);
        }
    }

    // Same-layer nets whose polygons touch are one conductor. Runs to
    // fixpoint; nets still carry no connections at this stage, so the
    // absorbed one can be dropped outright.
    fn merge_same_layer_nets(&mut self) {
        loop {
            let mut pair = None;
            'search: for i in 0..self.nets.len() {
                for j in (i + 1)..self.nets.len() {
                    if self.nets[i].layer == self.nets[j].layer
                        && self.nets[j]
                            .polygons
                            .iter()
                            .any(|p| self.nets[i].touches(p))
                    {
                        pair = Some((i, j));
                        break 'search;
                    }
                }
            }
            let Some((i, j)) = pair else { break };
            let absorbed = self.nets.remove(j);
            self.nets[i].polygons.extend(absorbed.polygons);
        }
    }

    // A net whose polygons reach a contact window, on either layer of the
    // contact's pair, is adjacent to that contact.
    fn wire_contacts_to_nets(&mut self) {
        for contact in &mut self.contacts {
            for net in &self.nets {
                if (net.layer == contact.lower_layer || net.layer == contact.upper_layer)
                    && net
                        .polygons
                        .iter()
                        .any(|p| p.intersects(&contact.window))
                {
                    contact.adjacent.insert(net.id);
                }
            }
        }
    }

    // An active-area contact overlapping a device's drain or source region
    // is adjacent to that device.
    fn wire_transistors_to_contacts(&mut self) {
        for contact in &mut self.contacts {
            if contact.lower_layer != "NA" {
                continue;
            }
            for trans in &self.transistors {
                if trans.drain.intersects(&contact.window)
                    || trans.source.intersects(&contact.window)
                {
                    contact.adjacent.insert(trans.id);
                }
            }
        }
    }

    // Two devices whose diffusion regions meet directly, with no contact in
    // between, still share a junction; a polygon-less net carries that
    // adjacency so the graph stays connected.
    fn synthesize_junction_nets(&mut self) {
        for (i, j) in (0..self.transistors.len()).tuple_combinations() {
            let a_id = self.transistors[i].id;
            let b_id = self.transistors[j].id;
            let through_contact = self.contacts.iter().any(|c| {
                c.lower_layer == "NA" && c.adjacent.contains(&a_id) && c.adjacent.contains(&b_id)
            });
            if through_contact {
                continue;
            }
            let junction = {
                let (a, b) = (&self.transistors[i], &self.transistors[j]);
                [&a.drain, &a.source]
                    .into_iter()
                    .cartesian_product([&b.drain, &b.source])
                    .any(|(p, q)| p.touches(q))
            };
            if !junction {
                continue;
            }

            let id = self.next_id();
            debug!("Junction net {} between devices {} and {}.", id, a_id, b_id);
            let mut net = Net::new(id, "NA", vec![]);
            net.connections.insert(a_id);
            net.connections.insert(b_id);
            self.nets.push(net);
            self.transistors[i].terminal_nets.insert(id);
            self.transistors[j].terminal_nets.insert(id);
        }
    }

    // Every SI net reaching a gate polygon drives that gate.
    fn attach_gate_edges(&mut self) {
        for trans in &mut self.transistors {
            for net in &self.nets {
                if net.layer == "SI" && net.touches(&trans.gate) {
                    trans.gate_nets.insert(net.id);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Absorption: contacts dissolve into mutual adjacency, then M2 and SI
    // nets absorb what they touch.
    // ------------------------------------------------------------------

    fn is_transistor_id(&self, id: u32) -> bool {
        self.transistors.iter().any(|t| t.id == id)
    }

    fn net_mut(&mut self, id: u32) -> &mut Net {
        self.nets
            .iter_mut()
            .find(|n| n.id == id)
            .expect("net id is valid")
    }

    fn transistor_mut(&mut self, id: u32) -> &mut Transistor {
        self.transistors
            .iter_mut()
            .find(|t| t.id == id)
            .expect("transistor id is valid")
    }

    // Each contact makes a clique of its neighbors: net/net pairs become
    // graph adjacency, net/transistor pairs become a terminal connection.
    // Transistor/transistor pairs ride through the shared net.
    fn absorb_contacts(&mut self) {
        for c_ix in 0..self.contacts.len() {
            let adjacent: Vec<u32> = self.contacts[c_ix].adjacent.iter().copied().collect();
            for (&a, &b) in adjacent.iter().tuple_combinations() {
                match (self.is_transistor_id(a), self.is_transistor_id(b)) {
                    (false, false) => {
                        self.net_mut(a).graph_connections.insert(b);
                        self.net_mut(b).graph_connections.insert(a);
                    }
                    (true, false) => {
                        self.transistor_mut(a).terminal_nets.insert(b);
                        self.net_mut(b).connections.insert(a);
                    }
                    (false, true) => {
                        self.transistor_mut(b).terminal_nets.insert(a);
                        self.net_mut(a).connections.insert(b);
                    }
                    (true, true) => {}
                }
            }
        }
        for net in &mut self.nets {
            let id = net.id;
            net.graph_connections.remove(&id);
        }
    }

    // Folds |absorbed| into |absorber|: the absorber inherits every
    // adjacency, the absorbed net goes invisible, and its id is rewritten
    // away everywhere so no edge can reference it again.
    fn absorb_net(&mut self, absorber: u32, absorbed: u32) {
        debug!("Net {} absorbs net {}.", absorber, absorbed);
        let (connections, graph_connections) = {
            let net = self.net_mut(absorbed);
            net.visible = false;
            (
                std::mem::take(&mut net.connections),
                std::mem::take(&mut net.graph_connections),
            )
        };

        let target = self.net_mut(absorber);
        target.connections.extend(connections.iter().copied());
        target
            .graph_connections
            .extend(graph_connections.iter().copied());
        target.graph_connections.remove(&absorber);
        target.graph_connections.remove(&absorbed);

        for trans in &mut self.transistors {
            if trans.terminal_nets.remove(&absorbed) {
                trans.terminal_nets.insert(absorber);
            }
            if trans.gate_nets.remove(&absorbed) {
                trans.gate_nets.insert(absorber);
            }
        }
        for net in &mut self.nets {
            if net.graph_connections.remove(&absorbed) && net.id != absorber {
                net.graph_connections.insert(absorber);
            }
        }
    }

    // A metal-2 net swallows every net it reaches through a contact, over
    // and over, until nothing adjacent to metal-2 is left standing.
    fn absorb_m2(&mut self) {
        loop {
            let pair = self
                .nets
                .iter()
                .filter(|m| m.visible && m.layer == "M2")
                .cartesian_product(self.nets.iter().filter(|n| n.visible))
                .find(|(m, n)| {
                    m.id != n.id
                        && (m.graph_connections.contains(&n.id)
                            || n.graph_connections.contains(&m.id))
                })
                .map(|(m, n)| (m.id, n.id));
            let Some((absorber, absorbed)) = pair else { break };
            self.absorb_net(absorber, absorbed);
        }
    }

    // A polysilicon net that drives a gate is a label for whatever metal
    // feeds it: the adjacent net absorbs it, and the gate edge follows.
    fn absorb_si(&mut self) {
        loop {
            let pair = self
                .nets
                .iter()
                .filter(|s| {
                    s.visible
                        && s.layer == "SI"
                        && self.transistors.iter().any(|t| t.gate_nets.contains(&s.id))
                })
                .cartesian_product(self.nets.iter().filter(|n| n.visible))
                .find(|(s, n)| {
                    s.id != n.id
                        && (s.graph_connections.contains(&n.id)
                            || n.graph_connections.contains(&s.id))
                })
                .map(|(s, n)| (n.id, s.id));
            let Some((absorber, absorbed)) = pair else { break };
            self.absorb_net(absorber, absorbed);
        }
    }

    /// Runs the absorption rules (once) and emits the final graph: all
    /// transistors and every still-visible net as nodes, terminal and gate
    /// edges between them.
    pub fn to_graph(&mut self) -> CircuitGraph {
        if !self.merged {
            self.absorb_contacts();
            self.absorb_m2();
            self.absorb_si();
            self.merged = true;
        }

        let mut graph = CircuitGraph::default();
        let mut by_id = BTreeMap::new();
        for trans in &self.transistors {
            let ix = graph.add_node(NodeInfo {
                id: trans.id,
                name: format!("{}{}", trans.kind, trans.id),
                kind: trans.kind.into(),
            });
            by_id.insert(trans.id, ix);
        }
        for net in self.nets.iter().filter(|n| n.visible) {
            let ix = graph.add_node(NodeInfo {
                id: net.id,
                name: format!("{}_{}", net.layer, net.id),
                kind: NodeKind::Bus,
            });
            by_id.insert(net.id, ix);
        }

        for trans in &self.transistors {
            let t_ix = by_id[&trans.id];
            for net_id in &trans.terminal_nets {
                if let Some(n_ix) = by_id.get(net_id) {
                    graph.add_edge(t_ix, *n_ix, crate::graph::EdgeKind::Terminal);
                }
            }
            for net_id in &trans.gate_nets {
                if let Some(n_ix) = by_id.get(net_id) {
                    graph.add_edge(t_ix, *n_ix, crate::graph::EdgeKind::Gate);
                }
            }
        }
        info!(
            "Layout graph: {} nodes, {} edges.",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvs_geometry::point::Pt;
    use lvs_geometry::polygon::Rect;

    // A minimal single-device layout: an active area crossed by a gate
    // strip, ohmic contacts on both pieces, and a contacted poly gate.
    fn single_n_device() -> Vec<(String, Polygon)> {
        let na = Rect(Pt(0, 0), (100, 40)).unwrap();
        let sn = Rect(Pt(40, -10), (20, 60)).unwrap();
        let left = Rect(Pt(0, 0), (40, 40)).unwrap();
        let right = Rect(Pt(60, 0), (40, 40)).unwrap();
        let si_strip = Rect(Pt(40, -10), (20, 60)).unwrap();
        let si_pad = Rect(Pt(40, 42), (20, 8)).unwrap();
        vec![
            ("NA".to_string(), na),
            ("SN".to_string(), sn),
            // Ohmic contact windows, inside each diffusion piece.
            ("CNA".to_string(), Rect(Pt(10, 10), (20, 20)).unwrap()),
            ("CNA".to_string(), Rect(Pt(70, 10), (20, 20)).unwrap()),
            // Metal patches matching the diffusion pieces: nets d and s.
            ("M1".to_string(), left),
            ("M1".to_string(), right),
            // Poly routing plus a contacted pad: net g.
            ("SI".to_string(), si_strip),
            ("SI".to_string(), si_pad.clone()),
            ("CSI".to_string(), Rect(Pt(45, 44), (10, 4)).unwrap()),
            ("M1".to_string(), si_pad),
        ]
    }

    #[test]
    fn test_single_device_extraction() {
        let mut circuit = LayoutCircuit::from_records(single_n_device());
        assert_eq!(circuit.transistors.len(), 1);
        assert_eq!(circuit.contacts.len(), 3);

        let graph = circuit.to_graph();
        assert_eq!(graph.node_count(), 4); // device + nets d, s, g
        assert_eq!(graph.edge_count(), 3);

        let trans = &circuit.transistors[0];
        assert_eq!(trans.terminal_nets.len(), 2);
        assert_eq!(trans.gate_nets.len(), 1);
    }

    #[test]
    fn test_drain_is_the_min_vertex_piece() {
        let circuit = LayoutCircuit::from_records(single_n_device());
        let trans = &circuit.transistors[0];
        assert_eq!(trans.drain, Rect(Pt(0, 0), (40, 40)).unwrap());
        assert_eq!(trans.source, Rect(Pt(60, 0), (40, 40)).unwrap());
    }

    #[test]
    fn test_invisible_nets_are_not_referenced() {
        let mut circuit = LayoutCircuit::from_records(single_n_device());
        let graph = circuit.to_graph();
        let invisible: Vec<u32> = circuit
            .nets
            .iter()
            .filter(|n| !n.visible)
            .map(|n| n.id)
            .collect();
        assert!(!invisible.is_empty()); // the poly routing net was absorbed
        for ix in graph.node_indices() {
            assert!(!invisible.contains(&graph[ix].id));
        }
        for trans in &circuit.transistors {
            for id in trans.terminal_nets.iter().chain(trans.gate_nets.iter()) {
                assert!(!invisible.contains(id));
            }
        }
    }

    #[test]
    fn test_empty_layout() {
        let mut circuit = LayoutCircuit::from_records(vec![]);
        let graph = circuit.to_graph();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let mut a = LayoutCircuit::from_records(single_n_device());
        let mut b = LayoutCircuit::from_records(single_n_device());
        assert_eq!(
            crate::graph::to_json(&a.to_graph()),
            crate::graph::to_json(&b.to_graph())
        );
    }

    #[test]
    fn test_stacked_devices_share_a_junction() {
        // One active area crossed by two gate strips: two devices in
        // series, with a bare diffusion junction between them.
        let records = vec![
            ("NA".to_string(), Rect(Pt(0, 0), (100, 40)).unwrap()),
            ("SN".to_string(), Rect(Pt(20, -10), (10, 60)).unwrap()),
            ("SN".to_string(), Rect(Pt(60, -10), (10, 60)).unwrap()),
        ];
        let circuit = LayoutCircuit::from_records(records);
        assert_eq!(circuit.transistors.len(), 2);
        let junctions: Vec<&Net> = circuit
            .nets
            .iter()
            .filter(|n| n.layer == "NA")
            .collect();
        assert_eq!(junctions.len(), 1);
        assert_eq!(junctions[0].connections.len(), 2);
    }
}
