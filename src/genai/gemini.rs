// SPDX-License-Identifier: MIT

//! Gemini client - Google's Gemini API implementation

use super::image::{ImageData, DEFAULT_MIME_TYPE};
use super::{GenerationClient, GenerationError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// The key travels in this header so it never appears in request URLs
const API_KEY_HEADER: &str = "x-goog-api-key";

const OPTIMIZE_INSTRUCTION: &str = "You are an expert prompt engineer for AI image generation. \
Rewrite the user's input into a highly detailed, creative and descriptive prompt optimized \
for an image generation model.\n\
Guidelines:\n\
1. Keep the language of the user's input.\n\
2. Focus on visual details: lighting, composition, artistic style, texture and mood.\n\
3. If the input is simple (e.g. \"banana\"), expand it into a full scene.\n\
4. Output ONLY the raw optimized prompt text, no explanations.";

/// Google Gemini image and text client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: Url,
    image_model: String,
    text_model: String,
}

impl GeminiClient {
    /// Create a client against the public endpoint with default models
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        Self::with_models(
            api_key,
            DEFAULT_API_BASE,
            DEFAULT_IMAGE_MODEL,
            DEFAULT_TEXT_MODEL,
        )
    }

    /// Create a client with explicit endpoint and model names
    pub fn with_models(
        api_key: impl Into<String>,
        api_base: &str,
        image_model: impl Into<String>,
        text_model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        // join() replaces the last path segment unless the base ends in '/'
        let api_base = if api_base.ends_with('/') {
            Url::parse(api_base)?
        } else {
            Url::parse(&format!("{}/", api_base))?
        };
        Ok(Self {
            client: Client::new(),
            api_key,
            api_base,
            image_model: image_model.into(),
            text_model: text_model.into(),
        })
    }

    /// Build the `generateContent` URL for a model
    fn endpoint(&self, model: &str) -> Result<Url, GenerationError> {
        Ok(self
            .api_base
            .join(&format!("v1beta/models/{}:generateContent", model))?)
    }

    async fn generate_content(&self, model: &str, body: &Value) -> Result<Value, GenerationError> {
        let url = self.endpoint(model)?;
        log::debug!("Gemini request to model {}", model);

        let resp = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            log::error!("Gemini API error: {}", text);
            return Err(GenerationError::Api(text));
        }

        Ok(resp.json().await?)
    }
}

/// Request body for an image generation call. Source images are sent as
/// `inlineData` after the text part.
pub fn image_request_body(prompt: &str, source: Option<&ImageData>) -> Value {
    let mut parts = vec![json!({ "text": prompt })];
    if let Some(image) = source {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.to_base64()
            }
        }));
    }
    json!({ "contents": { "parts": parts } })
}

/// Request body for the prompt rewrite call
pub fn optimize_request_body(prompt: &str) -> Value {
    json!({
        "contents": {
            "parts": [{
                "text": format!("{}\n\nUser input: \"{}\"", OPTIMIZE_INSTRUCTION, prompt)
            }]
        }
    })
}

fn first_candidate_parts(resp: &Value) -> Result<&Vec<Value>, GenerationError> {
    let candidate = resp["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or(GenerationError::NoCandidates)?;

    candidate["content"]["parts"]
        .as_array()
        .ok_or(GenerationError::NoContent)
}

/// Extract the first inline image from a `generateContent` response
pub fn parse_image_response(resp: &Value) -> Result<ImageData, GenerationError> {
    let parts = first_candidate_parts(resp)?;

    for part in parts {
        if let Some(inline) = part.get("inlineData") {
            let mime_type = inline["mimeType"].as_str().unwrap_or(DEFAULT_MIME_TYPE);
            let data = inline["data"]
                .as_str()
                .ok_or_else(|| GenerationError::InvalidImage("inlineData without data".into()))?;
            return ImageData::from_base64(mime_type, data);
        }
    }

    // A text-only answer is usually the model explaining why it refused
    if let Some(text) = parts.first().and_then(|p| p["text"].as_str()) {
        return Err(GenerationError::Refused(text.to_string()));
    }

    Err(GenerationError::NoImage)
}

/// Concatenate the text parts of a `generateContent` response
pub fn parse_text_response(resp: &Value) -> Result<String, GenerationError> {
    let parts = first_candidate_parts(resp)?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Ok(text.trim().to_string())
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_from_text(&self, prompt: &str) -> Result<ImageData, GenerationError> {
        log::info!("Text-to-image with {}", self.image_model);
        let body = image_request_body(prompt, None);
        let resp = self.generate_content(&self.image_model, &body).await?;
        parse_image_response(&resp)
    }

    async fn generate_from_image_and_text(
        &self,
        prompt: &str,
        source: &ImageData,
    ) -> Result<ImageData, GenerationError> {
        log::info!(
            "Image-to-image with {} ({}, {} bytes)",
            self.image_model,
            source.mime_type,
            source.len()
        );
        let body = image_request_body(prompt, Some(source));
        let resp = self.generate_content(&self.image_model, &body).await?;
        parse_image_response(&resp)
    }

    async fn rewrite_prompt(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = optimize_request_body(prompt);
        let resp = self.generate_content(&self.text_model, &body).await?;
        parse_text_response(&resp)
    }
}
