// SPDX-License-Identifier: MIT

//! Text-to-image and image-to-image modes
//!
//! Thin flows over the generation client: validate input, call the client,
//! wrap the result in a [`GeneratedImage`] record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::banana::error::StudioError;
use crate::genai::{GenerationClient, ImageData};

/// The three ways of using the studio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    TextToImage,
    ImageToImage,
    Workflow,
}

impl AppMode {
    pub const ALL: [AppMode; 3] = [
        AppMode::TextToImage,
        AppMode::ImageToImage,
        AppMode::Workflow,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AppMode::TextToImage => "Text to Image",
            AppMode::ImageToImage => "Image to Image",
            AppMode::Workflow => "Workflow",
        }
    }

    fn download_prefix(self) -> &'static str {
        match self {
            AppMode::TextToImage | AppMode::Workflow => "banana-gen",
            AppMode::ImageToImage => "banana-remix",
        }
    }
}

/// Quick style suffixes offered next to the prompt box
pub const STYLE_PRESETS: [&str; 6] = [
    "cyberpunk",
    "watercolor",
    "3D render",
    "pixel art",
    "Chinese ink landscape",
    "Ghibli style",
];

/// Append a style to a prompt, comma-separated
pub fn append_style(prompt: &str, style: &str) -> String {
    let style = style.trim();
    if style.is_empty() {
        return prompt.to_string();
    }
    if prompt.is_empty() {
        style.to_string()
    } else {
        format!("{}, {}", prompt, style)
    }
}

/// A finished generation
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedImage {
    pub id: Uuid,
    pub mode: AppMode,
    pub prompt: String,
    pub image: ImageData,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(mode: AppMode, prompt: impl Into<String>, image: ImageData) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            prompt: prompt.into(),
            image,
            created_at: Utc::now(),
        }
    }

    /// File name offered when downloading, e.g. `banana-gen-<id>.png`
    pub fn download_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.mode.download_prefix(),
            self.id,
            self.image.extension()
        )
    }
}

fn require_prompt(prompt: &str) -> Result<&str, StudioError> {
    if prompt.trim().is_empty() {
        return Err(StudioError::validation("Prompt must not be empty"));
    }
    Ok(prompt)
}

/// Entry point for the prompt-driven modes
#[derive(Clone)]
pub struct Studio {
    client: Arc<dyn GenerationClient>,
}

impl Studio {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self { client }
    }

    /// Generate an image from a prompt
    pub async fn text_to_image(&self, prompt: &str) -> Result<GeneratedImage, StudioError> {
        let prompt = require_prompt(prompt)?;
        let image = self.client.generate_from_text(prompt).await?;
        log::info!("Generated {} bytes ({})", image.len(), image.mime_type);
        Ok(GeneratedImage::new(AppMode::TextToImage, prompt, image))
    }

    /// Remix an uploaded image with an instruction
    pub async fn image_to_image(
        &self,
        prompt: &str,
        source: Option<&ImageData>,
    ) -> Result<GeneratedImage, StudioError> {
        let prompt = require_prompt(prompt)?;
        let source = source
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StudioError::validation("A source image is required"))?;
        let image = self
            .client
            .generate_from_image_and_text(prompt, source)
            .await?;
        log::info!("Remixed into {} bytes ({})", image.len(), image.mime_type);
        Ok(GeneratedImage::new(AppMode::ImageToImage, prompt, image))
    }

    /// Rewrite a prompt. Blank prompts are returned as-is without a call.
    pub async fn optimize(&self, prompt: &str) -> String {
        if prompt.trim().is_empty() {
            return prompt.to_string();
        }
        self.client.optimize_prompt(prompt).await
    }
}
