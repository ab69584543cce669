// SPDX-License-Identifier: MIT

//! Typed errors for the generation client layer
//!
//! Every variant renders as a human-readable message. Callers never inspect
//! structure beyond that; they display the string.

use thiserror::Error;

/// Errors surfaced by a [`GenerationClient`](super::GenerationClient)
#[derive(Debug, Error)]
pub enum GenerationError {
    /// API key not configured
    #[error("GOOGLE_API_KEY must be set")]
    MissingApiKey,

    /// Non-success status from the remote service
    #[error("Gemini API error: {0}")]
    Api(String),

    /// HTTP transport errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Malformed JSON in a response
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Invalid endpoint URL
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Response carried no candidates
    #[error("No candidates returned")]
    NoCandidates,

    /// First candidate had no content parts
    #[error("No content parts found")]
    NoContent,

    /// Model answered with text instead of an image
    #[error("Generation failed: {0}")]
    Refused(String),

    /// Parts were present but none of them was an image
    #[error("No image data found in response. The model may have returned only text.")]
    NoImage,

    /// Image payload could not be decoded
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    /// Anything else, carried as its message
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Create from a generic message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for GenerationError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for GenerationError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
