//! Prompt Commands
//!
//! Read and replace the system prompt handed to the pipeline.

use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Get the system prompt, or the built-in default when none is stored
pub async fn get_prompt(state: &AppState) -> CommandResponse<String> {
    CommandResponse::ok(state.prompts().load())
}

/// Persist a new system prompt
pub async fn save_prompt(state: &AppState, content: String) -> CommandResponse<bool> {
    state.prompts().save(&content).map(|()| true).into()
}
