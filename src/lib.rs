//! Konspekt Desktop - Backend Library
//!
//! This library provides the backend of the Konspekt desktop application,
//! which turns batches of `.docx` documents into a timeline by running an
//! external analysis pipeline.
//! It includes:
//! - Command handlers for the front-end
//! - The process supervisor and pipeline runner
//! - Storage for the settings document and system prompt
//! - Data models and utilities

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

// Re-export commonly used items from commands
pub use commands::{
    // Pipeline commands
    open_visualization, run_process,
    // Settings commands
    get_config, save_config, update_settings,
    // Prompt commands
    get_prompt, save_prompt,
    // Probe commands
    check_ollama, check_update,
};
pub use konspekt_core::{FailureReason, InvocationEvent, LogEvent, LogStream, Outcome};
pub use models::response::*;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::process::{InvocationHandle, ProcessSupervisor, SupervisorConfig};
pub use state::{AppContext, AppState};
pub use utils::error::{AppError, AppResult};
