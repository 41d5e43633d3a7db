//! Pipeline Commands
//!
//! Start a processing run and locate its visualization.

use std::path::PathBuf;

use crate::models::response::CommandResponse;
use crate::services::process::InvocationHandle;
use crate::services::visualization;
use crate::state::AppState;

/// Stage `files` and run the analysis pipeline over them.
///
/// Returns immediately; progress and the single terminal outcome arrive on
/// the handle. Must be called from within a tokio runtime.
pub fn run_process(state: &AppState, files: Vec<PathBuf>) -> InvocationHandle {
    state.runner().start(files)
}

/// Path of the timeline page produced by the last run
pub async fn open_visualization(state: &AppState) -> CommandResponse<PathBuf> {
    let config = state.config().load();
    visualization::visualization_path(state.paths(), &config).into()
}
