// SPDX-License-Identifier: MIT

//! Generation client layer
//!
//! This module provides the [`GenerationClient`] trait consumed by the studio
//! and the workflow executor, plus shared types:
//! - [error] - `GenerationError`
//! - [image] - `ImageData` and data-URL handling
//! - [gemini] - Google's Gemini implementation

pub mod error;
pub mod gemini;
pub mod image;

pub use error::GenerationError;
pub use gemini::GeminiClient;
pub use image::ImageData;

use async_trait::async_trait;

/// Boundary to the remote image-generation service
///
/// There is no retry or backoff; one failed call is one error.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Produce an image from a text prompt
    async fn generate_from_text(&self, prompt: &str) -> Result<ImageData, GenerationError>;

    /// Produce an edited image from a source image and an instruction
    async fn generate_from_image_and_text(
        &self,
        prompt: &str,
        source: &ImageData,
    ) -> Result<ImageData, GenerationError>;

    /// Rewrite a prompt into a more detailed one
    async fn rewrite_prompt(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Best-effort prompt rewrite. Returns the original prompt unchanged when
    /// the rewrite fails or comes back empty.
    async fn optimize_prompt(&self, prompt: &str) -> String {
        match self.rewrite_prompt(prompt).await {
            Ok(rewritten) if !rewritten.trim().is_empty() => rewritten.trim().to_string(),
            Ok(_) => prompt.to_string(),
            Err(e) => {
                log::warn!("Prompt optimization failed, keeping original: {}", e);
                prompt.to_string()
            }
        }
    }
}
