//! Graph compiler: transport document → validated, topologically ordered
//! DAG.
//!
//! Compilation is deliberately forgiving about node-level noise (empty ids,
//! dangling edges, self-loops are dropped silently) and strict about the
//! two properties the block processor depends on: both I/O terminators
//! exist, and the edge set is acyclic. Kahn's algorithm breaks indegree
//! ties in node insertion order, so the order is deterministic across
//! reloads of the same document.

use std::collections::{HashMap, VecDeque};

use cadena_core::NodeParams;
use tracing::debug;

use crate::error::GraphError;
use crate::transport::GraphDoc;

/// Reserved id and type of the input terminator.
pub const INPUT_ID: &str = "_input";

/// Reserved id and type of the output terminator.
pub const OUTPUT_ID: &str = "_output";

/// Structural node types carry no runtime: terminators, routing, and the
/// band splitter.
pub fn is_structural(effect_type: &str) -> bool {
    matches!(
        effect_type,
        "_input" | "_output" | "split" | "sum" | "split-freq"
    )
}

/// Types whose port-1 parents form a sidechain set.
pub fn is_sidechain_aware(effect_type: &str) -> bool {
    matches!(effect_type, "dyn-lookahead" | "vocoder")
}

/// A directed, port-addressed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Source node id.
    pub from: String,
    /// Destination node id.
    pub to: String,
    /// Source output port (0 = main, 1 = split-freq high band).
    pub from_port: usize,
    /// Destination input port (0 = main, 1 = sidechain).
    pub to_port: usize,
}

/// A compiled graph: nodes, adjacency, and topological order.
#[derive(Debug, Clone, Default)]
pub struct CompiledGraph {
    /// Node parameter bags by id.
    pub nodes: HashMap<String, NodeParams>,
    /// Incoming edges per node, in document order.
    pub incoming: HashMap<String, Vec<Edge>>,
    /// Outgoing edges per node, in document order.
    pub outgoing: HashMap<String, Vec<Edge>>,
    /// Topological order over every node id.
    pub order: Vec<String>,
}

impl CompiledGraph {
    /// True when no nodes survived compilation.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Incoming edges of a node (empty slice when none).
    pub fn parents(&self, id: &str) -> &[Edge] {
        self.incoming.get(id).map_or(&[], Vec::as_slice)
    }
}

/// Compile a JSON graph document.
///
/// An empty (or whitespace-only) document compiles to the empty graph, as
/// does any document missing either terminator. Malformed JSON is
/// [`GraphError::InvalidGraphJson`]; an edge set whose Kahn order cannot
/// cover every node is [`GraphError::CyclicGraph`].
pub fn compile(raw: &str) -> Result<CompiledGraph, GraphError> {
    if raw.trim().is_empty() {
        return Ok(CompiledGraph::default());
    }
    let doc: GraphDoc = serde_json::from_str(raw)?;
    compile_doc(&doc)
}

fn compile_doc(doc: &GraphDoc) -> Result<CompiledGraph, GraphError> {
    // Collect nodes, dropping unusable declarations. First declaration of
    // an id wins.
    let mut nodes: HashMap<String, NodeParams> = HashMap::new();
    let mut insertion: Vec<String> = Vec::new();
    for node in &doc.nodes {
        if node.id.is_empty() || node.effect_type.is_empty() {
            debug!(id = %node.id, "dropping node with empty id or type");
            continue;
        }
        if nodes.contains_key(&node.id) {
            debug!(id = %node.id, "dropping duplicate node id");
            continue;
        }
        nodes.insert(node.id.clone(), node.to_params());
        insertion.push(node.id.clone());
    }

    // Both terminators must be present with their reserved types.
    let has_input = nodes.get(INPUT_ID).is_some_and(|n| n.effect_type == INPUT_ID);
    let has_output = nodes
        .get(OUTPUT_ID)
        .is_some_and(|n| n.effect_type == OUTPUT_ID);
    if !has_input || !has_output {
        debug!(has_input, has_output, "graph lacks terminators; compiling empty");
        return Ok(CompiledGraph::default());
    }

    // Edges: drop self-loops and dangling endpoints; clamp negative ports.
    let mut incoming: HashMap<String, Vec<Edge>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<Edge>> = HashMap::new();
    for id in &insertion {
        incoming.insert(id.clone(), Vec::new());
        outgoing.insert(id.clone(), Vec::new());
    }
    for connection in &doc.connections {
        if connection.from == connection.to {
            debug!(id = %connection.from, "dropping self-loop");
            continue;
        }
        if !nodes.contains_key(&connection.from) || !nodes.contains_key(&connection.to) {
            debug!(from = %connection.from, to = %connection.to, "dropping dangling edge");
            continue;
        }
        let edge = Edge {
            from: connection.from.clone(),
            to: connection.to.clone(),
            from_port: connection.from_port_index.max(0) as usize,
            to_port: connection.to_port_index.max(0) as usize,
        };
        outgoing.get_mut(&edge.from).unwrap().push(edge.clone());
        incoming.get_mut(&edge.to).unwrap().push(edge);
    }

    // Kahn's algorithm; ties break in insertion order.
    let mut indegree: HashMap<&str, usize> = insertion
        .iter()
        .map(|id| (id.as_str(), incoming[id].len()))
        .collect();
    let mut queue: VecDeque<&str> = insertion
        .iter()
        .map(String::as_str)
        .filter(|id| indegree[id] == 0)
        .collect();

    let mut order = Vec::with_capacity(insertion.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        for edge in &outgoing[id] {
            let remaining = indegree.get_mut(edge.to.as_str()).unwrap();
            *remaining -= 1;
            if *remaining == 0 {
                queue.push_back(edge.to.as_str());
            }
        }
    }
    if order.len() != insertion.len() {
        return Err(GraphError::CyclicGraph);
    }

    Ok(CompiledGraph {
        nodes,
        incoming,
        outgoing,
        order,
    })
}
