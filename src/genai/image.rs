// SPDX-License-Identifier: MIT

//! Image payloads exchanged with the generation service
//!
//! Images travel as raw bytes plus a MIME type. On the wire (JSON, HTML
//! `<img src>`) they are data URLs: `data:image/png;base64,....`

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::error::GenerationError;

/// MIME type assumed when none is given
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Opaque image bytes with their MIME type
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Decode base64 image data as returned in an `inlineData` part
    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self, GenerationError> {
        let bytes = BASE64_STANDARD
            .decode(data.trim())
            .map_err(|e| GenerationError::InvalidImage(e.to_string()))?;
        Ok(Self::new(mime_type, bytes))
    }

    /// Parse a data URL. A bare base64 string (no `data:` header) is
    /// accepted as well and assumed to be PNG.
    pub fn from_data_url(url: &str) -> Result<Self, GenerationError> {
        let Some(rest) = url.strip_prefix("data:") else {
            return Self::from_base64(DEFAULT_MIME_TYPE, url);
        };

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| GenerationError::InvalidImage("data URL has no payload".into()))?;

        let Some(mime_type) = header.strip_suffix(";base64") else {
            return Err(GenerationError::InvalidImage(
                "only base64 data URLs are supported".into(),
            ));
        };
        let mime_type = if mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            mime_type
        };

        Self::from_base64(mime_type, data)
    }

    /// Infer the MIME type from a file extension, falling back to PNG
    pub fn mime_for_extension(ext: &str) -> &'static str {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "heic" => "image/heic",
            _ => DEFAULT_MIME_TYPE,
        }
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/heic" => "heic",
            _ => "png",
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Image blobs can be large; keep debug output to a summary.
impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for ImageData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        ImageData::from_data_url(&url).map_err(serde::de::Error::custom)
    }
}
