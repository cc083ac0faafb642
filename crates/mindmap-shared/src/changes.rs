//! Pure change application at the boundary with the graph UI.
//!
//! The canvas reports what the user did as change events; these functions
//! turn `(current graph, changes)` into the next graph without touching any
//! application state.

use serde::{Deserialize, Serialize};

use crate::types::{Edge, Node, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    Position {
        id: String,
        position: Option<Position>,
        #[serde(default)]
        dragging: bool,
    },
    /// Measured size reported by the renderer; not part of the document.
    Dimensions { id: String },
    Select { id: String, selected: bool },
    Remove { id: String },
    Add { item: Node },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    Remove { id: String },
    Add { item: Edge },
}

/// A new edge drawn between two node handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
}

pub fn apply_node_changes(nodes: &[Node], changes: &[NodeChange]) -> Vec<Node> {
    let mut next = nodes.to_vec();
    for change in changes {
        match change {
            NodeChange::Position { id, position, .. } => {
                if let (Some(node), Some(position)) =
                    (next.iter_mut().find(|n| &n.id == id), position)
                {
                    node.position = *position;
                }
            }
            NodeChange::Dimensions { .. } => {}
            NodeChange::Select { id, selected } => {
                if let Some(node) = next.iter_mut().find(|n| &n.id == id) {
                    node.selected = *selected;
                }
            }
            NodeChange::Remove { id } => next.retain(|n| &n.id != id),
            NodeChange::Add { item } => {
                if !next.iter().any(|n| n.id == item.id) {
                    next.push(item.clone());
                }
            }
        }
    }
    next
}

pub fn apply_edge_changes(edges: &[Edge], changes: &[EdgeChange]) -> Vec<Edge> {
    let mut next = edges.to_vec();
    for change in changes {
        match change {
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = next.iter_mut().find(|e| &e.id == id) {
                    edge.selected = *selected;
                }
            }
            EdgeChange::Remove { id } => next.retain(|e| &e.id != id),
            EdgeChange::Add { item } => {
                if !next.iter().any(|e| e.id == item.id) {
                    next.push(item.clone());
                }
            }
        }
    }
    next
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("edge-{source}-{target}")
}

/// Append an edge for `connection`. Self-loops and connections that already
/// exist (same source and target) leave the edges unchanged.
pub fn add_edge(connection: &Connection, edges: &[Edge]) -> Vec<Edge> {
    let mut next = edges.to_vec();
    if connection.source == connection.target {
        return next;
    }
    let exists = next
        .iter()
        .any(|e| e.source == connection.source && e.target == connection.target);
    if !exists {
        next.push(Edge::new(
            edge_id(&connection.source, &connection.target),
            connection.source.clone(),
            connection.target.clone(),
        ));
    }
    next
}

/// Edges that survive removing `node_id`.
pub fn detach_node(edges: &[Edge], node_id: &str) -> Vec<Edge> {
    edges
        .iter()
        .filter(|e| e.source != node_id && e.target != node_id)
        .cloned()
        .collect()
}
