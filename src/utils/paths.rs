//! Cross-Platform Path Utilities
//!
//! Resolves the user-data directory (settings, prompt, staged documents) and
//! the bundled application root (default settings, pipeline script, default
//! visualization output).

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "Konspekt HDP";
/// Persisted settings document handed to the pipeline
pub const CONFIG_FILE_NAME: &str = "config.yml";
/// Persisted system prompt handed to the pipeline
pub const PROMPT_FILE_NAME: &str = "system_prompt.txt";
/// Staging directory for dropped documents
pub const INPUT_DOCS_DIR_NAME: &str = "input_docs";
/// File produced by the pipeline's visualization step
pub const VISUALIZATION_FILE_NAME: &str = "tufte_timeline.html";

/// Get the per-user application data directory.
///
/// macOS: `~/Library/Application Support/Konspekt HDP`
/// Windows: `%APPDATA%/Konspekt HDP`
/// Linux: `~/.config/Konspekt HDP`
pub fn default_user_data_dir() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::config("Could not determine user configuration directory"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Resolved locations for one application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Writable per-user directory
    pub user_data_dir: PathBuf,
    /// Read-only application root holding bundled defaults and scripts
    pub root_dir: PathBuf,
}

impl AppPaths {
    pub fn new(user_data_dir: impl Into<PathBuf>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_data_dir: user_data_dir.into(),
            root_dir: root_dir.into(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.user_data_dir.join(CONFIG_FILE_NAME)
    }

    pub fn prompt_path(&self) -> PathBuf {
        self.user_data_dir.join(PROMPT_FILE_NAME)
    }

    pub fn input_docs_dir(&self) -> PathBuf {
        self.user_data_dir.join(INPUT_DOCS_DIR_NAME)
    }

    pub fn bundled_config(&self) -> PathBuf {
        self.root_dir.join(CONFIG_FILE_NAME)
    }

    pub fn bundled_prompt(&self) -> PathBuf {
        self.root_dir.join(PROMPT_FILE_NAME)
    }

    /// Pipeline entry script run by the interpreter in development mode
    pub fn pipeline_script(&self) -> PathBuf {
        self.root_dir.join("scripts").join("process_pipeline.py")
    }

    /// Visualization location when no output directory is configured
    pub fn default_visualization(&self) -> PathBuf {
        self.root_dir.join("md").join(VISUALIZATION_FILE_NAME)
    }
}
