//! Konspekt Core
//!
//! Foundational types for the Konspekt Desktop workspace. This crate has zero
//! dependencies on application-level code (process spawning, storage, CLI).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `events` - Invocation event model (`LogEvent`, `LogStream`, `Outcome`, `InvocationEvent`)
//! - `clock` - Injectable sleep abstraction used for retry backoff and timeouts

pub mod clock;
pub mod error;
pub mod events;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Invocation Events ──────────────────────────────────────────────────
pub use events::{FailureReason, InvocationEvent, LogEvent, LogStream, Outcome, STDERR_PREFIX};

// ── Clock ──────────────────────────────────────────────────────────────
pub use clock::Clock;
