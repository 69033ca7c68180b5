#![deny(missing_docs)]

//! The core logic of layout-versus-schematic verification: extracting a
//! circuit graph from a mask layout, building the same graph shape from a
//! netlist, canonicalizing both with series/parallel reduction, and testing
//! them for labeled (sub)graph isomorphism.
//!
//! All cross-references between transistors, contacts, and nets are integer
//! ids allocated from a per-circuit counter; nothing here holds references
//! into anything else, which is what keeps the merge passes simple.

pub mod contact;
pub mod discrepancy;
pub mod graph;
pub mod isomorphism;
pub mod layers;
pub mod layout;
pub mod net;
pub mod reduce;
pub mod schematic;
pub mod transistor;
pub mod verify;
