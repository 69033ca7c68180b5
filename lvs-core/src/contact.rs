//! A contact: a small polygon joining two stacked conducting layers.

use lvs_geometry::polygon::Polygon;
use std::collections::BTreeSet;

/// One recognized contact family, keyed by the layer holding the contact
/// windows themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactFamily {
    /// The layer holding the contact windows.
    pub contact_layer: &'static str,
    /// The layer holding the enclosing polygon underneath.
    pub enclosing_layer: &'static str,
    /// The metal layer expected above.
    pub upper_layer: &'static str,
    /// The tag this family stamps onto emitted contacts.
    pub tag: &'static str,
    /// Equipotential taps only need the upper patch to intersect the
    /// enclosing polygon; the other families demand polygon equality.
    pub equipotential: bool,
}

/// The six recognized contact families.
pub const CONTACT_FAMILIES: [ContactFamily; 6] = [
    ContactFamily { contact_layer: "CNA", enclosing_layer: "NA", upper_layer: "M1", tag: "CN", equipotential: false },
    ContactFamily { contact_layer: "CPA", enclosing_layer: "NA", upper_layer: "M1", tag: "CP", equipotential: false },
    ContactFamily { contact_layer: "CNE", enclosing_layer: "NA", upper_layer: "M1", tag: "CNE", equipotential: true },
    ContactFamily { contact_layer: "CPE", enclosing_layer: "NA", upper_layer: "M1", tag: "CPE", equipotential: true },
    ContactFamily { contact_layer: "CM1", enclosing_layer: "M1", upper_layer: "M2", tag: "CM", equipotential: false },
    ContactFamily { contact_layer: "CSI", enclosing_layer: "SI", upper_layer: "M1", tag: "CSI", equipotential: false },
];

/// A contact discovered in the layout. Contacts are intermediate: the net
/// merger dissolves each one into mutual adjacency among its neighbors, so
/// no contact survives into the final graph.
#[derive(Debug, Clone)]
pub struct Contact {
    /// The stable id.
    pub id: u32,
    /// The family tag, e.g. `CN` or `CM`.
    pub tag: &'static str,
    /// The lower layer of the joined pair.
    pub lower_layer: &'static str,
    /// The upper layer of the joined pair.
    pub upper_layer: &'static str,
    /// The contact window polygon itself.
    pub window: Polygon,
    /// The enclosing polygon on the lower layer.
    pub enclosing: Polygon,
    /// Ids of adjacent nets and transistors.
    pub adjacent: BTreeSet<u32>,
}
