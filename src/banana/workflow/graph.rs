// SPDX-License-Identifier: MIT

//! In-memory workflow graph
//!
//! Nodes and edges are kept in insertion order, which is also render order.
//! Ids come from monotonic counters that survive `clear`, so an id is never
//! handed out twice during a session.

use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use super::types::{Edge, EdgeId, Node, NodeId, NodeKind, NodePayload, Position};
use crate::banana::error::GraphError;

/// Prompt placed in the seeded Input node
pub const SEED_PROMPT: &str = "a cute robot banana eating a pixel apple";

/// Workflow graph: ordered nodes and directed edges
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    next_node: u64,
    #[serde(skip)]
    next_edge: u64,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the default linear pipeline: Input -> Process -> Output
    pub fn seeded() -> Self {
        let mut graph = Self::new();
        let input = graph.add_node_of_kind(NodeKind::Input, Position::new(50.0, 100.0));
        let process = graph.add_node_of_kind(NodeKind::Process, Position::new(350.0, 100.0));
        let output = graph.add_node_of_kind(NodeKind::Output, Position::new(650.0, 100.0));

        if let Some(node) = graph.node_mut(&input) {
            node.payload = NodePayload::Input {
                prompt: SEED_PROMPT.to_string(),
            };
        }
        // Endpoints were just created
        let _ = graph.add_edge(&input, &process);
        let _ = graph.add_edge(&process, &output);
        graph
    }

    /// Insert a node. The kind is the payload's variant.
    pub fn add_node(&mut self, position: Position, payload: NodePayload) -> NodeId {
        self.next_node += 1;
        let id = NodeId(self.next_node.to_string());
        let label = payload.kind().default_label().to_string();
        self.nodes.push(Node {
            id: id.clone(),
            label,
            position,
            payload,
        });
        log::debug!("Added node {}", id);
        id
    }

    /// Insert a node with the empty payload for `kind`
    pub fn add_node_of_kind(&mut self, kind: NodeKind, position: Position) -> NodeId {
        self.add_node(position, kind.empty_payload())
    }

    /// Delete a node and every edge touching it. Returns whether it existed.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| &n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| !e.touches(id));
        log::debug!("Removed node {}", id);
        true
    }

    /// Replace a node's payload. Missing nodes are ignored; a payload of
    /// another kind is rejected.
    pub fn update_payload(&mut self, id: &NodeId, payload: NodePayload) -> Result<(), GraphError> {
        let Some(node) = self.node_mut(id) else {
            return Ok(());
        };
        if node.kind() != payload.kind() {
            return Err(GraphError::KindMismatch {
                node: id.clone(),
                expected: node.kind(),
                actual: payload.kind(),
            });
        }
        node.payload = payload;
        Ok(())
    }

    /// Replace a node's position. Missing nodes are ignored.
    pub fn move_node(&mut self, id: &NodeId, position: Position) {
        if let Some(node) = self.node_mut(id) {
            node.position = position;
        }
    }

    /// Connect two existing nodes
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<EdgeId, GraphError> {
        for endpoint in [source, target] {
            if self.node(endpoint).is_none() {
                return Err(GraphError::UnknownNode(endpoint.clone()));
            }
        }
        self.next_edge += 1;
        let id = EdgeId(format!("e{}", self.next_edge));
        self.edges.push(Edge {
            id: id.clone(),
            source: source.clone(),
            target: target.clone(),
        });
        Ok(id)
    }

    /// Delete an edge. Returns whether it existed.
    pub fn remove_edge(&mut self, id: &EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| &e.id != id);
        self.edges.len() != before
    }

    /// Remove all nodes and edges. Id counters keep running.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    /// Whether `to` can be reached from `from` along directed edges
    pub fn is_connected(&self, from: &NodeId, to: &NodeId) -> bool {
        let mut seen: HashSet<&NodeId> = HashSet::new();
        let mut queue: VecDeque<&NodeId> = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            queue.extend(
                self.edges
                    .iter()
                    .filter(|e| &e.source == current)
                    .map(|e| &e.target),
            );
        }
        false
    }
}
