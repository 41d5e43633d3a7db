//! Core Error Types
//!
//! Defines the foundational error types used across the Konspekt workspace.
//! These error types are dependency-free (only thiserror + serde_json) to keep
//! the core crate lightweight.
//!
//! The main application crate extends these with additional error variants
//! (e.g., Config, NotFound) for storage and command handling.

use thiserror::Error;

/// Core error type for the Konspekt workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
