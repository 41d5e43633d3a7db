//! Spawn Error Classification
//!
//! Only resource contention at process creation (`EAGAIN`, surfaced by std as
//! `ErrorKind::WouldBlock`) is retried. Every other spawn failure is final.

use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnErrorClass {
    /// The OS is temporarily out of process resources; retry after a backoff
    Transient,
    /// Missing executable, permission denied, bad working directory, ...
    Fatal,
}

pub fn classify_spawn_error(err: &io::Error) -> SpawnErrorClass {
    match err.kind() {
        io::ErrorKind::WouldBlock => SpawnErrorClass::Transient,
        _ => SpawnErrorClass::Fatal,
    }
}

/// User-facing description of a spawn failure
pub fn describe_spawn_error(err: &io::Error, program: &Path) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => format!(
            "Executable not found: {} ({})",
            program.display(),
            err
        ),
        io::ErrorKind::PermissionDenied => format!(
            "Permission denied for {} ({})",
            program.display(),
            err
        ),
        _ => err.to_string(),
    }
}
