// SPDX-License-Identifier: MIT

//! Typed error handling for the studio
//!
//! `StudioError` is the top-level type returned at the outer boundaries
//! (CLI, server, studio modes). The workflow layer has its own narrower
//! types which convert into it.

use thiserror::Error;

use crate::banana::workflow::types::{NodeId, NodeKind};
use crate::genai::GenerationError;

/// Top-level error type for nano-banana-rs
#[derive(Debug, Error)]
pub enum StudioError {
    /// Rejected user input (empty prompt, missing source image)
    #[error("{0}")]
    Validation(String),

    /// Configuration errors (missing env vars, invalid config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from the generation service
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Graph mutation errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Executor errors
    #[error("Workflow error: {0}")]
    Executor(#[from] ExecutorError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl StudioError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Graph mutation errors
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// Edge endpoint does not exist
    #[error("Node '{0}' not found")]
    UnknownNode(NodeId),

    /// Payload variant does not match the node's kind
    #[error("Node '{node}' has kind {expected}, payload has kind {actual}")]
    KindMismatch {
        node: NodeId,
        expected: NodeKind,
        actual: NodeKind,
    },
}

/// Executor errors
#[derive(Debug, Error, PartialEq)]
pub enum ExecutorError {
    /// A run is already in flight
    #[error("Workflow is already running")]
    AlreadyRunning,
}
