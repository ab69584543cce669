// SPDX-License-Identifier: MIT

//! Workflow graph type definitions
//!
//! This module defines the core types of the workflow canvas: nodes, their
//! kind-keyed payloads, edges and canvas positions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::genai::ImageData;

/// Stable node identifier, never reused within a graph's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Stable edge identifier, never reused within a graph's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A point in canvas (or screen) space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// The three roles a node can play in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Input,
    Process,
    Output,
}

impl NodeKind {
    /// Label given to freshly added nodes
    pub fn default_label(self) -> &'static str {
        match self {
            NodeKind::Input => "Prompt",
            NodeKind::Process => "Gemini Generator",
            NodeKind::Output => "Result",
        }
    }

    /// Empty payload for this kind
    pub fn empty_payload(self) -> NodePayload {
        match self {
            NodeKind::Input => NodePayload::Input {
                prompt: String::new(),
            },
            NodeKind::Process => NodePayload::Process,
            NodeKind::Output => NodePayload::Output { image: None },
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Input => "input",
            NodeKind::Process => "process",
            NodeKind::Output => "output",
        };
        f.write_str(s)
    }
}

/// Kind-specific node data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodePayload {
    /// Prompt text typed by the user
    Input { prompt: String },
    /// Stateless pass-through to the generator
    Process,
    /// Generated image, absent until a run succeeds
    Output { image: Option<ImageData> },
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Input { .. } => NodeKind::Input,
            NodePayload::Process => NodeKind::Process,
            NodePayload::Output { .. } => NodeKind::Output,
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        match self {
            NodePayload::Input { prompt } => Some(prompt),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&ImageData> {
        match self {
            NodePayload::Output { image } => image.as_ref(),
            _ => None,
        }
    }
}

/// A typed unit of the workflow graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub position: Position,
    pub payload: NodePayload,
}

impl Node {
    /// Kind is carried by the payload variant, so it cannot drift from it
    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }
}

/// A directed connection, source to target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}
