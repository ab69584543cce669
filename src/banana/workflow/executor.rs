// SPDX-License-Identifier: MIT

//! Workflow executor
//!
//! Runs the fixed Input -> Process -> Output pipeline: the Input node's
//! prompt goes to the generation client and the resulting image lands in the
//! Output node. Nodes are located by kind, not by walking edges.
//!
//! State machine: `Idle -> Running -> (Succeeded | Failed) -> Idle`. The
//! terminal states are reported as the returned [`RunOutcome`]; by the time
//! `run` returns the executor is `Idle` again.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};

use super::editor::Editor;
use super::graph::Graph;
use super::types::{NodeId, NodeKind, NodePayload};
use crate::banana::error::ExecutorError;
use crate::genai::GenerationClient;

/// Whether a run is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorState {
    Idle,
    Running,
}

/// Why a run ended in `Failed`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunFailure {
    /// Not exactly one node of each kind
    #[error(
        "Incomplete pipeline: need exactly one input, process and output node \
         (found {inputs}/{processes}/{outputs})"
    )]
    IncompletePipeline {
        inputs: usize,
        processes: usize,
        outputs: usize,
    },

    /// The generation client returned an error
    #[error("{0}")]
    Generation(String),

    /// The Output node was deleted while the client call was in flight
    #[error("Output node '{0}' was removed during the run")]
    OutputRemoved(NodeId),
}

/// Terminal result of one run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Succeeded { output: NodeId },
    Failed(RunFailure),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. })
    }
}

/// Progress events for streaming runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutorEvent {
    Started { prompt: String },
    Succeeded { output: NodeId },
    Failed(String),
    Rejected(String),
}

/// Point-in-time executor status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutorStatus {
    pub state: ExecutorState,
    pub last_error: Option<String>,
}

/// The nodes a run will touch
#[derive(Debug)]
struct Pipeline {
    prompt: String,
    output: NodeId,
}

/// Resets the running flag however the run ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-flight executor for the workflow pipeline
pub struct WorkflowExecutor {
    client: Arc<dyn GenerationClient>,
    running: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl WorkflowExecutor {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            running: AtomicBool::new(false),
            last_error: RwLock::new(None),
        }
    }

    pub fn state(&self) -> ExecutorState {
        if self.running.load(Ordering::SeqCst) {
            ExecutorState::Running
        } else {
            ExecutorState::Idle
        }
    }

    /// Message of the most recent failed run, cleared when a new run starts
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn status(&self) -> ExecutorStatus {
        ExecutorStatus {
            state: self.state(),
            last_error: self.last_error().await,
        }
    }

    /// Run the pipeline once. A second call while one is in flight is
    /// rejected and never reaches the generation client.
    pub async fn run(&self, editor: &Mutex<Editor>) -> Result<RunOutcome, ExecutorError> {
        self.execute(editor, None).await
    }

    /// Run with progress events sent to `tx`
    pub async fn run_stream(
        &self,
        editor: &Mutex<Editor>,
        tx: mpsc::Sender<ExecutorEvent>,
    ) -> Result<RunOutcome, ExecutorError> {
        self.execute(editor, Some(&tx)).await
    }

    fn begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    async fn execute(
        &self,
        editor: &Mutex<Editor>,
        events: Option<&mpsc::Sender<ExecutorEvent>>,
    ) -> Result<RunOutcome, ExecutorError> {
        let Some(_guard) = self.begin() else {
            log::warn!("Run rejected: workflow already running");
            emit(events, ExecutorEvent::Rejected(ExecutorError::AlreadyRunning.to_string())).await;
            return Err(ExecutorError::AlreadyRunning);
        };
        *self.last_error.write().await = None;

        // The editor lock is released before the client call so the canvas
        // stays editable while the run is in flight.
        let pipeline = {
            let editor = editor.lock().await;
            resolve_pipeline(editor.graph())
        };
        let pipeline = match pipeline {
            Ok(p) => p,
            Err(failure) => return Ok(self.fail(failure, events).await),
        };

        log::info!("Running workflow, output node {}", pipeline.output);
        emit(
            events,
            ExecutorEvent::Started {
                prompt: pipeline.prompt.clone(),
            },
        )
        .await;

        let image = match self.client.generate_from_text(&pipeline.prompt).await {
            Ok(image) => image,
            Err(e) => {
                log::error!("Workflow generation failed: {}", e);
                return Ok(self.fail(RunFailure::Generation(e.to_string()), events).await);
            }
        };

        {
            let mut editor = editor.lock().await;
            if editor.graph().node(&pipeline.output).is_none() {
                drop(editor);
                return Ok(self
                    .fail(RunFailure::OutputRemoved(pipeline.output), events)
                    .await);
            }
            let payload = NodePayload::Output { image: Some(image) };
            if let Err(e) = editor.update_payload(&pipeline.output, payload) {
                drop(editor);
                return Ok(self.fail(RunFailure::Generation(e.to_string()), events).await);
            }
        }

        log::info!("Workflow succeeded, image written to {}", pipeline.output);
        emit(
            events,
            ExecutorEvent::Succeeded {
                output: pipeline.output.clone(),
            },
        )
        .await;
        Ok(RunOutcome::Succeeded {
            output: pipeline.output,
        })
    }

    async fn fail(
        &self,
        failure: RunFailure,
        events: Option<&mpsc::Sender<ExecutorEvent>>,
    ) -> RunOutcome {
        let message = failure.to_string();
        log::warn!("Workflow failed: {}", message);
        *self.last_error.write().await = Some(message.clone());
        emit(events, ExecutorEvent::Failed(message)).await;
        RunOutcome::Failed(failure)
    }
}

async fn emit(events: Option<&mpsc::Sender<ExecutorEvent>>, event: ExecutorEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

/// Locate the single Input and Output nodes (and check for the Process node)
fn resolve_pipeline(graph: &Graph) -> Result<Pipeline, RunFailure> {
    let inputs: Vec<_> = graph.nodes_of_kind(NodeKind::Input).collect();
    let processes = graph.nodes_of_kind(NodeKind::Process).count();
    let outputs: Vec<_> = graph.nodes_of_kind(NodeKind::Output).collect();

    let (input, output) = match (inputs.as_slice(), processes, outputs.as_slice()) {
        ([input], 1, [output]) => (*input, *output),
        _ => {
            return Err(RunFailure::IncompletePipeline {
                inputs: inputs.len(),
                processes,
                outputs: outputs.len(),
            })
        }
    };

    if !graph.is_connected(&input.id, &output.id) {
        log::warn!(
            "Input {} is not connected to output {}; running by node kind",
            input.id,
            output.id
        );
    }

    Ok(Pipeline {
        prompt: input.payload.prompt().unwrap_or_default().to_string(),
        output: output.id.clone(),
    })
}
