//! An extracted transistor: a gate region carved across an active area.

use lvs_cif::netlist::Kind;
use lvs_geometry::polygon::Polygon;
use std::collections::BTreeSet;

/// A transistor discovered in the layout. The drain/source distinction is
/// arbitrary (the device is symmetric) but stable across runs.
#[derive(Debug, Clone)]
pub struct Transistor {
    /// The stable id.
    pub id: u32,
    /// The channel kind, from the gate layer that produced the device.
    pub kind: Kind,
    /// The gate polygon.
    pub gate: Polygon,
    /// The active-area piece on the side of the parent region's smallest
    /// vertex.
    pub drain: Polygon,
    /// The active-area piece on the other side.
    pub source: Polygon,
    /// Ids of the nets this device's drain/source terminals reach.
    pub terminal_nets: BTreeSet<u32>,
    /// Ids of the nets driving this device's gate.
    pub gate_nets: BTreeSet<u32>,
}

impl Transistor {
    /// A new transistor with empty edge-sets.
    pub fn new(id: u32, kind: Kind, gate: Polygon, drain: Polygon, source: Polygon) -> Transistor {
        Transistor {
            id,
            kind,
            gate,
            drain,
            source,
            terminal_nets: BTreeSet::new(),
            gate_nets: BTreeSet::new(),
        }
    }
}
