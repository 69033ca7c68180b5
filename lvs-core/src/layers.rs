//! The layer store: a name → polygon-bag map.

use lvs_geometry::polygon::Polygon;
use std::collections::BTreeMap;

/// Per-layer polygon storage. A `BTreeMap` keeps layer iteration order
/// deterministic, which the extraction passes rely on for stable ids.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    layers: BTreeMap<String, Vec<Polygon>>,
}

impl LayerStore {
    /// An empty store.
    pub fn new() -> LayerStore {
        LayerStore::default()
    }

    /// Appends a polygon to the named layer, creating the layer on first use.
    pub fn add(&mut self, layer: &str, polygon: Polygon) {
        self.layers.entry(layer.to_string()).or_default().push(polygon);
    }

    /// Reduces every layer to a set: duplicate polygons (equal as vertex
    /// cycles) are dropped, keeping the first occurrence.
    pub fn dedup(&mut self) {
        for polygons in self.layers.values_mut() {
            let mut kept: Vec<Polygon> = vec![];
            for polygon in polygons.drain(..) {
                if !kept.contains(&polygon) {
                    kept.push(polygon);
                }
            }
            *polygons = kept;
        }
    }

    /// The polygons of the named layer, or None if the layer never appeared.
    pub fn find(&self, layer: &str) -> Option<&[Polygon]> {
        self.layers.get(layer).map(|v| v.as_slice())
    }

    /// Replaces the polygon bag of the named layer.
    pub fn replace(&mut self, layer: &str, polygons: Vec<Polygon>) {
        self.layers.insert(layer.to_string(), polygons);
    }
}
