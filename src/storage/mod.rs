//! Storage Layer
//!
//! Handles all data persistence: the settings document and the system prompt.

pub mod config;
pub mod prompt;

pub use config::*;
pub use prompt::*;
