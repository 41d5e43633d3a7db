//! Visualization Locator
//!
//! Finds the timeline page produced by the pipeline's last run.

use std::path::{Path, PathBuf};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{AppPaths, VISUALIZATION_FILE_NAME};

/// Where the visualization is expected for the given settings
pub fn expected_visualization_path(paths: &AppPaths, config: &AppConfig) -> PathBuf {
    match config.output_path.as_deref() {
        Some(output) => Path::new(output).join(VISUALIZATION_FILE_NAME),
        None => paths.default_visualization(),
    }
}

/// Resolve the visualization, failing if the pipeline has not produced it.
pub fn visualization_path(paths: &AppPaths, config: &AppConfig) -> AppResult<PathBuf> {
    let path = expected_visualization_path(paths, config);
    if path.is_file() {
        Ok(path)
    } else {
        Err(AppError::not_found(format!(
            "Visualization file not found at {}. Processing may not have finished, \
             or the file was removed.",
            path.display()
        )))
    }
}
