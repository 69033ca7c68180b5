//! An equipotential net: a union of touching polygons on one routing layer.

use lvs_geometry::polygon::Polygon;
use std::collections::BTreeSet;

/// A net. Starts as a single polygon on its layer; same-layer merging and
/// absorption grow it; once absorbed into another net it is marked
/// invisible and never comes back.
#[derive(Debug, Clone)]
pub struct Net {
    /// The stable id.
    pub id: u32,
    /// The routing layer this net lives on (`M1`, `M2`, `SI`, or `NA` for
    /// synthesized junction nets).
    pub layer: String,
    /// The polygons making up the net. Empty for synthesized junction nets.
    pub polygons: Vec<Polygon>,
    /// Ids of transistors incident via drain/source terminals.
    pub connections: BTreeSet<u32>,
    /// Ids of neighbor nets after merging.
    pub graph_connections: BTreeSet<u32>,
    /// False once this net has been absorbed into another.
    pub visible: bool,
}

impl Net {
    /// A new single-polygon net.
    pub fn new(id: u32, layer: &str, polygons: Vec<Polygon>) -> Net {
        Net {
            id,
            layer: layer.to_string(),
            polygons,
            connections: BTreeSet::new(),
            graph_connections: BTreeSet::new(),
            visible: true,
        }
    }

    /// True if any of this net's polygons touches the given polygon.
    /// Equality, area overlap, and mere edge contact all count: abutting
    /// metal on one layer is one conductor.
    pub fn touches(&self, polygon: &Polygon) -> bool {
        self.polygons.iter().any(|p| p.touches(polygon))
    }
}
