//! System Prompt Storage
//!
//! Persists the extraction prompt the pipeline sends to the LLM. The
//! placeholders (`{topics_list}`, doubled braces) are filled in by the
//! pipeline, so the text is stored verbatim.

use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::error::AppResult;

/// Prompt used when no user copy exists
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("default_system_prompt.txt");

#[derive(Debug, Clone)]
pub struct PromptStore {
    prompt_path: PathBuf,
}

impl PromptStore {
    pub fn new(prompt_path: impl Into<PathBuf>) -> Self {
        Self {
            prompt_path: prompt_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.prompt_path
    }

    /// Copy the bundled prompt into place if no user copy exists yet.
    pub fn seed_from(&self, bundled: &Path) -> AppResult<bool> {
        if self.prompt_path.exists() || !bundled.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.prompt_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(bundled, &self.prompt_path)?;
        Ok(true)
    }

    /// Current prompt text, or the default when missing or unreadable
    pub fn load(&self) -> String {
        if !self.prompt_path.exists() {
            return DEFAULT_SYSTEM_PROMPT.to_string();
        }
        fs::read_to_string(&self.prompt_path).unwrap_or_else(|e| {
            tracing::warn!(
                "Failed to read prompt {}, using default: {}",
                self.prompt_path.display(),
                e
            );
            DEFAULT_SYSTEM_PROMPT.to_string()
        })
    }

    pub fn save(&self, content: &str) -> AppResult<()> {
        if let Some(parent) = self.prompt_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.prompt_path, content)?;
        Ok(())
    }
}
