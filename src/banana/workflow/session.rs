// SPDX-License-Identifier: MIT

//! A workflow canvas session: one editor plus its executor
//!
//! The editor sits behind an async mutex. The executor only holds that lock
//! for short reads and writes, never across the generation call.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use super::editor::{DragSession, Editor};
use super::executor::{ExecutorEvent, ExecutorStatus, RunOutcome, WorkflowExecutor};
use super::render::{connectors, Connector};
use super::types::{Edge, Node, NodeId};
use crate::banana::error::ExecutorError;
use crate::genai::GenerationClient;

/// Serializable view of the session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub connectors: Vec<Connector>,
    pub selection: Option<NodeId>,
    pub drag: Option<DragSession>,
    pub executor: ExecutorStatus,
}

pub struct WorkflowSession {
    editor: Mutex<Editor>,
    executor: WorkflowExecutor,
}

impl WorkflowSession {
    /// New session on the seeded graph
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self::with_editor(client, Editor::default())
    }

    pub fn with_editor(client: Arc<dyn GenerationClient>, editor: Editor) -> Self {
        Self {
            editor: Mutex::new(editor),
            executor: WorkflowExecutor::new(client),
        }
    }

    pub fn editor(&self) -> &Mutex<Editor> {
        &self.editor
    }

    pub fn executor(&self) -> &WorkflowExecutor {
        &self.executor
    }

    pub async fn run(&self) -> Result<RunOutcome, ExecutorError> {
        self.executor.run(&self.editor).await
    }

    pub async fn run_stream(
        &self,
        tx: mpsc::Sender<ExecutorEvent>,
    ) -> Result<RunOutcome, ExecutorError> {
        self.executor.run_stream(&self.editor, tx).await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let executor = self.executor.status().await;
        let editor = self.editor.lock().await;
        let graph = editor.graph();
        SessionSnapshot {
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
            connectors: connectors(graph),
            selection: editor.selection().cloned(),
            drag: editor.drag_session().cloned(),
            executor,
        }
    }
}
