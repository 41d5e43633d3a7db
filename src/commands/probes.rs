//! Probe Commands

use crate::models::response::{CommandResponse, OllamaStatus, UpdateStatus};
use crate::services::probe;
use crate::state::AppState;

/// Detect a local Ollama install and its models
pub async fn check_ollama() -> CommandResponse<OllamaStatus> {
    CommandResponse::ok(probe::check_ollama().await)
}

/// Pull application updates into the application root
pub async fn check_update(state: &AppState) -> CommandResponse<UpdateStatus> {
    let status = probe::check_update(&state.paths().root_dir).await;
    if status.success {
        tracing::info!("Update check: {}", status.message);
    } else {
        tracing::warn!("Update check failed: {}", status.message);
    }
    CommandResponse::ok(status)
}
