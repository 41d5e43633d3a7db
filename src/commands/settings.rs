//! Settings Commands
//!
//! Commands for reading and updating the settings document.

use crate::models::response::CommandResponse;
use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::state::AppState;

/// Get the current settings, falling back to defaults
pub async fn get_config(state: &AppState) -> CommandResponse<AppConfig> {
    CommandResponse::ok(state.config().load())
}

/// Replace the whole settings document
pub async fn save_config(state: &AppState, config: AppConfig) -> CommandResponse<AppConfig> {
    match state.config().save(&config) {
        Ok(()) => CommandResponse::ok(config),
        Err(e) => {
            tracing::error!("Failed to save config: {}", e);
            CommandResponse::err(e.to_string())
        }
    }
}

/// Update settings with a partial update
pub async fn update_settings(
    state: &AppState,
    update: SettingsUpdate,
) -> CommandResponse<AppConfig> {
    state.config().update(update).into()
}
