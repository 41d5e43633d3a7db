//! Settings Document Management
//!
//! Handles reading and writing the settings document shared with the
//! analysis pipeline. The document is YAML; JSON documents from older
//! installs load unchanged since JSON is a subset of YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};

/// Configuration service for the persisted settings document
#[derive(Debug, Clone)]
pub struct ConfigService {
    config_path: PathBuf,
}

impl ConfigService {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Copy a bundled default document into place if none exists yet.
    ///
    /// Returns whether a copy was made.
    pub fn seed_from(&self, bundled: &Path) -> AppResult<bool> {
        if self.config_path.exists() || !bundled.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(bundled, &self.config_path)?;
        tracing::info!(
            "Seeded settings from bundled defaults: {}",
            self.config_path.display()
        );
        Ok(true)
    }

    /// Get the effective configuration: defaults overlaid with the stored document.
    ///
    /// A missing document yields the defaults. An unreadable one is logged and
    /// also yields the defaults.
    pub fn load(&self) -> AppConfig {
        if !self.config_path.exists() {
            return AppConfig::default();
        }
        match Self::load_from_file(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Failed to read settings {}, using defaults: {}",
                    self.config_path.display(),
                    e
                );
                AppConfig::default()
            }
        }
    }

    /// Load configuration from a file, merged over the defaults
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        let stored: Value = serde_yaml::from_str(&content)?;
        merge_with_defaults(stored)
    }

    /// Save the whole document as YAML
    pub fn save(&self, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(config)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Apply a partial update and persist the result
    pub fn update(&self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut config = self.load();
        config.apply_update(update);
        self.save(&config)?;
        Ok(config)
    }

    /// Configured pipeline output directory, if any
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.load().output_path.map(PathBuf::from)
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        !self.config_path.exists() || Self::load_from_file(&self.config_path).is_ok()
    }
}

/// Overlay a stored document on the defaults.
///
/// `llm_settings` is merged key by key; every other top-level key replaces
/// the default wholesale.
fn merge_with_defaults(stored: Value) -> AppResult<AppConfig> {
    let mut merged = serde_json::to_value(AppConfig::default())?;

    let stored = match stored {
        Value::Null => return Ok(AppConfig::default()),
        Value::Object(map) => map,
        other => {
            return Err(AppError::config(format!(
                "settings document must be a mapping, found {}",
                json_kind(&other)
            )))
        }
    };

    let Some(target) = merged.as_object_mut() else {
        return Err(AppError::internal("default settings did not serialize to a mapping"));
    };

    for (key, value) in stored {
        if value.is_null() && (key == "llm_settings" || key == "output_path") {
            continue;
        }
        if key == "llm_settings" {
            if let (Value::Object(overrides), Some(Value::Object(base))) =
                (&value, target.get_mut("llm_settings"))
            {
                base.extend(overrides.clone());
                continue;
            }
        }
        target.insert(key, value);
    }

    Ok(serde_json::from_value(merged)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
