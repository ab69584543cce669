// SPDX-License-Identifier: MIT

//! Runtime configuration
//!
//! Values come from the environment (after `.env` is loaded by `main`). An
//! optional YAML file may override everything except the API key, which is
//! only ever read from the environment.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use url::Url;

use crate::banana::error::StudioError;
use crate::genai::gemini::{DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use crate::genai::{GeminiClient, GenerationError};

pub const DEFAULT_PORT: u16 = 3000;

/// Resolved studio configuration
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub image_model: String,
    pub text_model: String,
    pub port: u16,
}

/// Optional overrides read from a YAML file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub api_base: Option<String>,
    pub image_model: Option<String>,
    pub text_model: Option<String>,
    pub port: Option<u16>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl StudioConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, StudioError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through a key lookup. `GOOGLE_API_KEY` wins over
    /// `API_KEY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StudioError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            api_key: lookup("GOOGLE_API_KEY")
                .or_else(|| lookup("API_KEY"))
                .filter(|k| !k.trim().is_empty()),
            ..Self::default()
        };
        if let Some(base) = lookup("BANANA_API_BASE") {
            config.api_base = base;
        }
        if let Some(model) = lookup("BANANA_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(model) = lookup("BANANA_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(port) = lookup("BANANA_PORT") {
            config.port = port
                .parse()
                .map_err(|_| StudioError::config(format!("BANANA_PORT is not a port: {}", port)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a YAML file
    pub fn merge_file<P: AsRef<Path>>(self, path: P) -> Result<Self, StudioError> {
        let content = fs::read_to_string(path)?;
        self.merge_yaml(&content)
    }

    pub fn merge_yaml(mut self, content: &str) -> Result<Self, StudioError> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        if let Some(base) = file.api_base {
            self.api_base = base;
        }
        if let Some(model) = file.image_model {
            self.image_model = model;
        }
        if let Some(model) = file.text_model {
            self.text_model = model;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), StudioError> {
        Url::parse(&self.api_base)
            .map_err(|e| StudioError::config(format!("invalid api base '{}': {}", self.api_base, e)))?;
        if self.image_model.trim().is_empty() || self.text_model.trim().is_empty() {
            return Err(StudioError::config("model names must not be empty"));
        }
        Ok(())
    }

    /// Build the Gemini client for this configuration
    pub fn gemini_client(&self) -> Result<GeminiClient, StudioError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;
        Ok(GeminiClient::with_models(
            api_key,
            &self.api_base,
            &self.image_model,
            &self.text_model,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StudioConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_google_key_preferred() {
        let config =
            StudioConfig::from_lookup(lookup(&[("API_KEY", "b"), ("GOOGLE_API_KEY", "a")]))
                .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("a"));

        let config = StudioConfig::from_lookup(lookup(&[("API_KEY", "b")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("b"));
    }

    #[test]
    fn test_blank_google_key_is_unset() {
        let config = StudioConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "  "),
            ("BANANA_IMAGE_MODEL", "custom-image"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.image_model, "custom-image");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_bad_port_rejected() {
        let err = StudioConfig::from_lookup(lookup(&[("BANANA_PORT", "banana")])).unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn test_bad_api_base_rejected() {
        let err =
            StudioConfig::from_lookup(lookup(&[("BANANA_API_BASE", "not a url")])).unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
image_model: gemini-3-pro-image
port: 8080
"#;
        let config = StudioConfig::default().merge_yaml(yaml).unwrap();
        assert_eq!(config.image_model, "gemini-3-pro-image");
        assert_eq!(config.port, 8080);
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let err = StudioConfig::default()
            .merge_yaml("api_key: leaked")
            .unwrap_err();
        assert!(matches!(err, StudioError::Yaml(_)));
    }

    #[test]
    fn test_client_requires_key() {
        let err = StudioConfig::default().gemini_client().err().unwrap();
        assert!(matches!(
            err,
            StudioError::Generation(GenerationError::MissingApiKey)
        ));
    }
}
