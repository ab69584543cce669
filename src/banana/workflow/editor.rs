// SPDX-License-Identifier: MIT

//! Interactive editing layer over the workflow graph
//!
//! The editor turns pointer input into graph mutations and owns the two
//! pieces of transient UI state: the selected node and the active drag
//! session. All graph mutations go through here so selection and drag state
//! can never point at a node that no longer exists.

use serde::{Deserialize, Serialize};

use super::graph::Graph;
use super::types::{EdgeId, NodeId, NodeKind, NodePayload, Position};
use crate::banana::error::GraphError;

/// What a pointer event landed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "node", rename_all = "snake_case")]
pub enum PointerTarget {
    /// Empty canvas
    Canvas,
    /// A node's body (header, borders, preview)
    Node(NodeId),
    /// The prompt text field inside a node
    PayloadEditor(NodeId),
    /// The node's close button
    DeleteControl(NodeId),
}

/// An in-progress node reposition gesture, alive from pointer-down to
/// pointer-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragSession {
    pub node: NodeId,
    pub pointer_start: Position,
    pub node_start: Position,
}

impl DragSession {
    /// Absolute node position for the current pointer location
    pub fn position_for(&self, pointer: Position) -> Position {
        self.node_start + (pointer - self.pointer_start)
    }
}

/// Graph editor: graph plus selection plus drag session
#[derive(Debug, Clone)]
pub struct Editor {
    graph: Graph,
    selection: Option<NodeId>,
    drag: Option<DragSession>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Graph::seeded())
    }
}

impl Editor {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            selection: None,
            drag: None,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn selection(&self) -> Option<&NodeId> {
        self.selection.as_ref()
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    // === Pointer protocol ===

    /// Pointer pressed. Only a node body starts a drag session; a new
    /// session always replaces the previous one.
    pub fn pointer_down(&mut self, target: &PointerTarget, at: Position) {
        let PointerTarget::Node(id) = target else {
            return;
        };
        let Some(node) = self.graph.node(id) else {
            return;
        };

        if let Some(previous) = self.drag.take() {
            log::debug!("Drag of {} superseded by {}", previous.node, id);
        }
        self.drag = Some(DragSession {
            node: id.clone(),
            pointer_start: at,
            node_start: node.position,
        });
        self.selection = Some(id.clone());
    }

    /// Pointer moved. Repositions the dragged node, if any.
    pub fn pointer_move(&mut self, at: Position) {
        if let Some(drag) = &self.drag {
            self.graph.move_node(&drag.node, drag.position_for(at));
        }
    }

    /// Pointer released anywhere. Ends the drag session.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Click. Nodes and their prompt field select; the close button deletes;
    /// empty canvas clears the selection.
    pub fn click(&mut self, target: &PointerTarget) {
        match target {
            PointerTarget::Canvas => self.clear_selection(),
            PointerTarget::Node(id) | PointerTarget::PayloadEditor(id) => self.select(id),
            PointerTarget::DeleteControl(id) => {
                self.remove_node(id);
            }
        }
    }

    /// Select a node if it exists
    pub fn select(&mut self, id: &NodeId) {
        if self.graph.node(id).is_some() {
            self.selection = Some(id.clone());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // === Mutations ===

    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        self.graph.add_node_of_kind(kind, position)
    }

    /// Remove a node, its edges, and any selection or drag pointing at it
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        if !self.graph.remove_node(id) {
            return false;
        }
        if self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
        if self.drag.as_ref().is_some_and(|d| &d.node == id) {
            self.drag = None;
        }
        true
    }

    /// Replace the prompt of an Input node
    pub fn edit_prompt(&mut self, id: &NodeId, prompt: impl Into<String>) -> Result<(), GraphError> {
        self.graph.update_payload(
            id,
            NodePayload::Input {
                prompt: prompt.into(),
            },
        )
    }

    pub fn update_payload(&mut self, id: &NodeId, payload: NodePayload) -> Result<(), GraphError> {
        self.graph.update_payload(id, payload)
    }

    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Result<EdgeId, GraphError> {
        self.graph.add_edge(source, target)
    }

    pub fn disconnect(&mut self, id: &EdgeId) -> bool {
        self.graph.remove_edge(id)
    }

    /// Empty the canvas
    pub fn clear(&mut self) {
        self.graph.clear();
        self.selection = None;
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (Editor, NodeId, NodeId, NodeId) {
        let editor = Editor::default();
        let ids: Vec<NodeId> = editor.graph().nodes().iter().map(|n| n.id.clone()).collect();
        (editor, ids[0].clone(), ids[1].clone(), ids[2].clone())
    }

    fn position_of(editor: &Editor, id: &NodeId) -> Position {
        editor.graph().node(id).unwrap().position
    }

    #[test]
    fn test_drag_moves_node_by_pointer_displacement() {
        let (mut editor, input, _, _) = seeded();
        let start = position_of(&editor, &input);

        editor.pointer_down(&PointerTarget::Node(input.clone()), Position::new(10.0, 10.0));
        editor.pointer_move(Position::new(40.0, 25.0));

        assert_eq!(position_of(&editor, &input), start + Position::new(30.0, 15.0));
    }

    #[test]
    fn test_drag_is_absolute_so_path_returns_home() {
        let (mut editor, input, _, _) = seeded();
        let start = position_of(&editor, &input);
        let origin = Position::new(200.0, 200.0);

        editor.pointer_down(&PointerTarget::Node(input.clone()), origin);
        let mut pointer = origin;
        for step in [(5.0, 0.0), (5.0, 0.0), (-10.0, 0.0)] {
            pointer = pointer + Position::new(step.0, step.1);
            editor.pointer_move(pointer);
        }
        editor.pointer_up();

        assert_eq!(position_of(&editor, &input), start);
    }

    #[test]
    fn test_replaying_pointer_path_is_idempotent() {
        let (mut editor, input, _, _) = seeded();
        let path = [Position::new(3.0, 4.0), Position::new(8.0, -2.0)];

        editor.pointer_down(&PointerTarget::Node(input.clone()), Position::default());
        for p in path {
            editor.pointer_move(p);
        }
        let once = position_of(&editor, &input);
        for p in path {
            editor.pointer_move(p);
        }
        assert_eq!(position_of(&editor, &input), once);
    }

    #[test]
    fn test_pointer_up_ends_session() {
        let (mut editor, input, _, _) = seeded();
        editor.pointer_down(&PointerTarget::Node(input.clone()), Position::default());
        editor.pointer_up();
        assert!(editor.drag_session().is_none());

        let before = position_of(&editor, &input);
        editor.pointer_move(Position::new(100.0, 100.0));
        assert_eq!(position_of(&editor, &input), before);
    }

    #[test]
    fn test_last_pointer_down_wins() {
        let (mut editor, input, process, _) = seeded();
        let input_start = position_of(&editor, &input);
        let process_start = position_of(&editor, &process);

        editor.pointer_down(&PointerTarget::Node(input.clone()), Position::default());
        editor.pointer_down(&PointerTarget::Node(process.clone()), Position::default());
        editor.pointer_move(Position::new(7.0, 7.0));

        assert_eq!(editor.drag_session().unwrap().node, process);
        assert_eq!(position_of(&editor, &input), input_start);
        assert_eq!(
            position_of(&editor, &process),
            process_start + Position::new(7.0, 7.0)
        );
    }

    #[test]
    fn test_payload_editor_never_starts_drag() {
        let (mut editor, input, _, _) = seeded();
        let start = position_of(&editor, &input);

        editor.pointer_down(
            &PointerTarget::PayloadEditor(input.clone()),
            Position::default(),
        );
        editor.pointer_move(Position::new(50.0, 50.0));

        assert!(editor.drag_session().is_none());
        assert_eq!(position_of(&editor, &input), start);
    }

    #[test]
    fn test_pointer_down_selects_node() {
        let (mut editor, _, process, _) = seeded();
        editor.pointer_down(&PointerTarget::Node(process.clone()), Position::default());
        assert_eq!(editor.selection(), Some(&process));
    }

    #[test]
    fn test_click_selection_protocol() {
        let (mut editor, input, _, output) = seeded();

        editor.click(&PointerTarget::Node(output.clone()));
        assert_eq!(editor.selection(), Some(&output));

        editor.click(&PointerTarget::PayloadEditor(input.clone()));
        assert_eq!(editor.selection(), Some(&input));

        editor.click(&PointerTarget::Canvas);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_click_delete_control_removes_node() {
        let (mut editor, _, process, _) = seeded();
        editor.click(&PointerTarget::DeleteControl(process.clone()));
        assert!(editor.graph().node(&process).is_none());
        assert!(editor.graph().edges().is_empty());
    }

    #[test]
    fn test_removing_selected_node_clears_selection() {
        let (mut editor, input, _, _) = seeded();
        editor.select(&input);
        editor.remove_node(&input);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_removing_other_or_missing_node_keeps_selection() {
        let (mut editor, input, process, _) = seeded();
        editor.select(&input);

        assert!(!editor.remove_node(&"missing".into()));
        assert_eq!(editor.selection(), Some(&input));

        assert!(editor.remove_node(&process));
        assert_eq!(editor.selection(), Some(&input));
    }

    #[test]
    fn test_removing_dragged_node_ends_session() {
        let (mut editor, input, _, _) = seeded();
        editor.pointer_down(&PointerTarget::Node(input.clone()), Position::default());
        editor.remove_node(&input);
        assert!(editor.drag_session().is_none());
        editor.pointer_move(Position::new(1.0, 1.0));
    }

    #[test]
    fn test_edit_prompt() {
        let (mut editor, input, _, output) = seeded();
        editor.edit_prompt(&input, "a red apple").unwrap();
        assert_eq!(
            editor.graph().node(&input).unwrap().payload.prompt(),
            Some("a red apple")
        );
        assert!(editor.edit_prompt(&output, "nope").is_err());
    }

    #[test]
    fn test_clear_resets_transient_state() {
        let (mut editor, input, _, _) = seeded();
        editor.pointer_down(&PointerTarget::Node(input), Position::default());
        editor.clear();
        assert!(editor.graph().nodes().is_empty());
        assert!(editor.graph().edges().is_empty());
        assert!(editor.selection().is_none());
        assert!(editor.drag_session().is_none());
    }

    #[test]
    fn test_pointer_target_wire_format() {
        let target: PointerTarget =
            serde_json::from_str(r#"{"type":"payload_editor","node":"1"}"#).unwrap();
        assert_eq!(target, PointerTarget::PayloadEditor("1".into()));
        let canvas: PointerTarget = serde_json::from_str(r#"{"type":"canvas"}"#).unwrap();
        assert_eq!(canvas, PointerTarget::Canvas);
    }
}
