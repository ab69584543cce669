// SPDX-License-Identifier: MIT

//! Connector geometry for drawing edges on the canvas

use serde::Serialize;

use super::graph::Graph;
use super::types::{EdgeId, Position};

/// Rendered width of a node card
pub const NODE_WIDTH: f64 = 256.0;
/// Vertical offset of the connection handles from a node's top edge
pub const HANDLE_OFFSET_Y: f64 = 70.0;
/// Horizontal pull of the curve's control points
pub const CURVE_PULL: f64 = 50.0;

/// A curved connector from a node's right handle to another node's left handle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub edge: EdgeId,
    pub from: Position,
    pub to: Position,
    /// SVG path data for a cubic Bezier curve
    pub path: String,
}

impl Connector {
    fn between(edge: EdgeId, source: Position, target: Position) -> Self {
        let from = Position::new(source.x + NODE_WIDTH, source.y + HANDLE_OFFSET_Y);
        let to = Position::new(target.x, target.y + HANDLE_OFFSET_Y);
        let path = format!(
            "M {} {} C {} {}, {} {}, {} {}",
            from.x,
            from.y,
            from.x + CURVE_PULL,
            from.y,
            to.x - CURVE_PULL,
            to.y,
            to.x,
            to.y
        );
        Self {
            edge,
            from,
            to,
            path,
        }
    }
}

/// Connectors for every edge whose endpoints both exist
pub fn connectors(graph: &Graph) -> Vec<Connector> {
    graph
        .edges()
        .iter()
        .filter_map(|edge| {
            let source = graph.node(&edge.source)?;
            let target = graph.node(&edge.target)?;
            Some(Connector::between(
                edge.id.clone(),
                source.position,
                target.position,
            ))
        })
        .collect()
}
