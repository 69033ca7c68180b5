//! The circuit graph: an undirected labeled multigraph of transistors and
//! nets, plus its JSON export/import.

use lvs_cif::netlist::Kind;
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The label of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// An n-channel transistor.
    N,
    /// A p-channel transistor.
    P,
    /// An equipotential net.
    Bus,
}

impl NodeKind {
    /// True for transistor nodes of either channel kind.
    pub fn is_transistor(&self) -> bool {
        matches!(self, NodeKind::N | NodeKind::P)
    }
}

impl From<Kind> for NodeKind {
    fn from(kind: Kind) -> NodeKind {
        match kind {
            Kind::N => NodeKind::N,
            Kind::P => NodeKind::P,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::N => write!(f, "N"),
            NodeKind::P => write!(f, "P"),
            NodeKind::Bus => write!(f, "bus"),
        }
    }
}

/// The label of a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// A drain/source connection between a transistor and a net.
    Terminal,
    /// A gate connection between a transistor and a net.
    Gate,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Terminal => write!(f, "terminal"),
            EdgeKind::Gate => write!(f, "gate"),
        }
    }
}

/// The payload of a graph node: a stable id, a human-readable name, and the
/// node label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// The stable id, unique within one circuit.
    pub id: u32,
    /// A display name, e.g. `N3` or `M1_7`.
    pub name: String,
    /// The node label.
    pub kind: NodeKind,
}

/// The circuit graph. Stable indices, so nodes and edges can be removed
/// (trial deletions, pattern-edge removal) without renumbering the rest.
pub type CircuitGraph = StableUnGraph<NodeInfo, EdgeKind>;

/// A general error arising from reading a graph back from JSON.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphJsonError {
    /// A required field was missing or had the wrong type.
    #[error("Missing or mistyped field {0:?}.")]
    MissingField(&'static str),
    /// A node or edge label was not one of the known labels.
    #[error("Unknown label {0:?}.")]
    UnknownLabel(String),
    /// An edge referenced a node id that was not declared.
    #[error("Edge endpoint {0} is not a declared node id.")]
    UnknownNode(u64),
}

/// Finds the node with the given stable id.
pub fn node_by_id(graph: &CircuitGraph, id: u32) -> Option<NodeIndex> {
    graph.node_indices().find(|ix| graph[*ix].id == id)
}

/// Counts nodes per degree.
pub fn degree_histogram(graph: &CircuitGraph) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for ix in graph.node_indices() {
        *histogram.entry(graph.edges(ix).count()).or_insert(0) += 1;
    }
    histogram
}

/// Serializes a graph to the interchange shape:
/// `{"nodes": [{"id", "name", "label"}], "edges": [{"source", "target", "label"}]}`.
pub fn to_json(graph: &CircuitGraph) -> Value {
    let mut nodes: Vec<&NodeInfo> = graph.node_weights().collect();
    nodes.sort_by_key(|info| info.id);

    let mut edges: Vec<(u32, u32, EdgeKind)> = graph
        .edge_references()
        .map(|edge| {
            let a = graph[edge.source()].id;
            let b = graph[edge.target()].id;
            (a.min(b), a.max(b), *edge.weight())
        })
        .collect();
    edges.sort();

    json!({
        "nodes": nodes
            .iter()
            .map(|info| json!({
                "id": info.id,
                "name": info.name,
                "label": info.kind.to_string(),
            }))
            .collect::<Vec<_>>(),
        "edges": edges
            .iter()
            .map(|(source, target, kind)| json!({
                "source": source,
                "target": target,
                "label": kind.to_string(),
            }))
            .collect::<Vec<_>>(),
    })
}

/// Deserializes a graph from the interchange shape produced by [`to_json`].
pub fn from_json(value: &Value) -> Result<CircuitGraph, GraphJsonError> {
    let mut graph = CircuitGraph::default();
    let mut by_id: BTreeMap<u64, NodeIndex> = BTreeMap::new();

    let nodes = value["nodes"]
        .as_array()
        .ok_or(GraphJsonError::MissingField("nodes"))?;
    for node in nodes {
        let id = node["id"]
            .as_u64()
            .ok_or(GraphJsonError::MissingField("id"))?;
        let name = node["name"]
            .as_str()
            .ok_or(GraphJsonError::MissingField("name"))?;
        let label = node["label"]
            .as_str()
            .ok_or(GraphJsonError::MissingField("label"))?;
        let kind = match label {
            "N" => NodeKind::N,
            "P" => NodeKind::P,
            "bus" => NodeKind::Bus,
            other => return Err(GraphJsonError::UnknownLabel(other.to_string())),
        };
        let ix = graph.add_node(NodeInfo {
            id: id as u32,
            name: name.to_string(),
            kind,
        });
        by_id.insert(id, ix);
    }

    let edges = value["edges"]
        .as_array()
        .ok_or(GraphJsonError::MissingField("edges"))?;
    for edge in edges {
        let source = edge["source"]
            .as_u64()
            .ok_or(GraphJsonError::MissingField("source"))?;
        let target = edge["target"]
            .as_u64()
            .ok_or(GraphJsonError::MissingField("target"))?;
        let label = edge["label"]
            .as_str()
            .ok_or(GraphJsonError::MissingField("label"))?;
        let kind = match label {
            "terminal" => EdgeKind::Terminal,
            "gate" => EdgeKind::Gate,
            other => return Err(GraphJsonError::UnknownLabel(other.to_string())),
        };
        let a = *by_id
            .get(&source)
            .ok_or(GraphJsonError::UnknownNode(source))?;
        let b = *by_id
            .get(&target)
            .ok_or(GraphJsonError::UnknownNode(target))?;
        graph.add_edge(a, b, kind);
    }

    Ok(graph)
}
