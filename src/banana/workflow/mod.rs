// SPDX-License-Identifier: MIT

//! Workflow canvas
//!
//! This module provides the node graph behind the workflow canvas:
//! - `Graph` - nodes, edges and their invariants
//! - `Editor` - pointer-driven dragging, selection and mutations
//! - `WorkflowExecutor` - single-flight pipeline runs
//! - `WorkflowSession` - editor and executor bundled for one user session

pub mod editor;
pub mod executor;
pub mod graph;
pub mod render;
pub mod session;
pub mod types;

pub use editor::{DragSession, Editor, PointerTarget};
pub use executor::{
    ExecutorEvent, ExecutorState, ExecutorStatus, RunFailure, RunOutcome, WorkflowExecutor,
};
pub use graph::Graph;
pub use session::{SessionSnapshot, WorkflowSession};
pub use types::{Edge, EdgeId, Node, NodeId, NodeKind, NodePayload, Position};
