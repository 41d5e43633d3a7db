//! Settings Models
//!
//! The settings document shared with the analysis pipeline. The pipeline
//! reads `llm_settings` itself, so unknown keys are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PROVIDER: &str = "openrouter";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// LLM connection settings consumed by the extraction step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider id: "openrouter", "openai", "ollama", ...
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            temperature: None,
            timeout: None,
            extra: Map::new(),
        }
    }
}

/// Application configuration stored in config.yml
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm_settings: LlmSettings,
    /// Directory the pipeline writes into; staging defaults apply when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub output_path: Option<String>,
    /// Remove a configured output path
    #[serde(default)]
    pub clear_output_path: bool,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(provider) = update.provider {
            self.llm_settings.provider = provider;
        }
        if let Some(api_key) = update.api_key {
            self.llm_settings.api_key = Some(api_key).filter(|k| !k.is_empty());
        }
        if let Some(model) = update.model {
            self.llm_settings.model = model;
        }
        if let Some(base_url) = update.base_url {
            self.llm_settings.base_url = Some(base_url).filter(|u| !u.is_empty());
        }
        if update.clear_output_path {
            self.output_path = None;
        }
        if let Some(output_path) = update.output_path {
            self.output_path = Some(output_path);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.llm_settings.provider.trim().is_empty() {
            return Err("llm_settings.provider must not be empty".to_string());
        }
        if self.llm_settings.model.trim().is_empty() {
            return Err("llm_settings.model must not be empty".to_string());
        }
        if let Some(temperature) = self.llm_settings.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "llm_settings.temperature must be between 0 and 2, got {}",
                    temperature
                ));
            }
        }
        if matches!(self.output_path.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err("output_path must not be blank".to_string());
        }
        Ok(())
    }
}
