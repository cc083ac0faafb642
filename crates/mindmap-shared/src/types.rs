//! Mind-map data model.
//!
//! [`Document`] is the plaintext graph persisted (encrypted) per project. Its
//! JSON shape uses camelCase keys so documents written by the web client and
//! by this crate are interchangeable.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKGROUND_COLOR, DEFAULT_FONT_SIZE, DEFAULT_NODE_LABEL, DEFAULT_TEXT_COLOR,
    MAX_FONT_SIZE, MIN_FONT_SIZE, TRANSPARENT,
};

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// Project metadata, as listed in the sidebar. The document itself is only
/// fetched when the project is opened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Content and style of one node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    pub font_size: u32,
    pub text_color: String,
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            label: DEFAULT_NODE_LABEL.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            bold: None,
            italic: None,
        }
    }
}

impl NodeData {
    pub fn is_transparent(&self) -> bool {
        self.background_color == TRANSPARENT
    }
}

/// Partial update coming from the node editor. `None` fields are left as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeDataPatch {
    pub label: Option<String>,
    pub font_size: Option<u32>,
    pub text_color: Option<String>,
    pub background_color: Option<String>,
    /// `true` switches the background to transparent, `false` back to white.
    pub transparent_background: Option<bool>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

impl NodeDataPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn apply(&self, data: &mut NodeData) {
        if let Some(ref label) = self.label {
            data.label = label.clone();
        }
        if let Some(size) = self.font_size {
            data.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        }
        if let Some(ref color) = self.text_color {
            data.text_color = color.clone();
        }
        if let Some(ref color) = self.background_color {
            data.background_color = color.clone();
        }
        if let Some(transparent) = self.transparent_background {
            data.background_color = if transparent {
                TRANSPARENT.to_string()
            } else {
                DEFAULT_BACKGROUND_COLOR.to_string()
            };
        }
        if let Some(bold) = self.bold {
            data.bold = Some(bold);
        }
        if let Some(italic) = self.italic {
            data.italic = Some(italic);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub position: Position,
    pub data: NodeData,
    /// UI selection flag; never persisted.
    #[serde(skip)]
    pub selected: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            kind: None,
            position: Position { x, y },
            data: NodeData::default(),
            selected: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip)]
    pub selected: bool,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind: None,
            selected: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The node/edge graph of one project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Integrity problems found by [`Document::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentDefect {
    #[error("duplicate node id {0}")]
    DuplicateNodeId(String),

    #[error("duplicate edge id {0}")]
    DuplicateEdgeId(String),

    #[error("edge {edge_id} references missing node {missing}")]
    DanglingEdge { edge_id: String, missing: String },
}

impl Document {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Report duplicate ids and edges whose endpoints are not in the document.
    pub fn validate(&self) -> Vec<DocumentDefect> {
        let mut defects = Vec::new();

        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                defects.push(DocumentDefect::DuplicateNodeId(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                defects.push(DocumentDefect::DuplicateEdgeId(edge.id.clone()));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    defects.push(DocumentDefect::DanglingEdge {
                        edge_id: edge.id.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        defects
    }

    /// Drop edges whose source or target node is missing. Returns how many
    /// edges were removed.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let node_ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let before = self.edges.len();
        self.edges.retain(|e| {
            node_ids.contains(e.source.as_str()) && node_ids.contains(e.target.as_str())
        });
        before - self.edges.len()
    }
}
