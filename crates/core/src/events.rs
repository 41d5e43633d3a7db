//! Invocation Event Types
//!
//! Front-end agnostic event model for one pipeline invocation. A consumer
//! receives any number of [`InvocationEvent::Log`] events followed by exactly
//! one [`InvocationEvent::Finished`], after which the stream ends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Marker prepended to every chunk read from the child's standard error.
pub const STDERR_PREFIX: &str = "ERROR: ";

/// Origin of a log chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStream {
    /// Child process standard output
    Stdout,
    /// Child process standard error
    Stderr,
    /// Messages produced by the supervisor or runner itself
    Supervisor,
}

impl LogStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Supervisor => "supervisor",
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogStream {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            "supervisor" => Ok(Self::Supervisor),
            other => Err(CoreError::parse(format!("unknown log stream: {}", other))),
        }
    }
}

/// One unit of streamed diagnostic or progress text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Position within the invocation, starting at 0
    pub seq: u64,
    /// Channel the text arrived on
    pub stream: LogStream,
    /// Text as delivered to the front-end (stderr chunks carry [`STDERR_PREFIX`])
    pub text: String,
}

impl LogEvent {
    /// Build an event, applying the stream's marker to `chunk`.
    pub fn new(seq: u64, stream: LogStream, chunk: impl AsRef<str>) -> Self {
        let chunk = chunk.as_ref();
        let text = match stream {
            LogStream::Stderr => format!("{}{}", STDERR_PREFIX, chunk),
            LogStream::Stdout | LogStream::Supervisor => chunk.to_string(),
        };
        Self { seq, stream, text }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }
}

/// Why an invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No eligible input files were staged; nothing was spawned
    NoInputFiles,
    /// The process could not be started and the error is not retryable
    SpawnFailed { message: String },
    /// Every spawn attempt hit a transient OS error
    SpawnRetriesExhausted { attempts: u32, message: String },
    /// The child exited with a non-zero status
    ExitCode { code: i32 },
    /// The child ended without an exit code (e.g. killed by a signal)
    Terminated,
    /// The caller cancelled the invocation
    Cancelled,
    /// The child outlived the configured timeout
    TimedOut { after_secs: u64 },
    /// Waiting on the child failed
    Io { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInputFiles => write!(f, "no input files"),
            Self::SpawnFailed { message } => write!(f, "failed to start: {}", message),
            Self::SpawnRetriesExhausted { attempts, message } => {
                write!(f, "failed to start after {} attempts: {}", attempts, message)
            }
            Self::ExitCode { code } => write!(f, "exited with code {}", code),
            Self::Terminated => write!(f, "terminated without an exit code"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::TimedOut { after_secs } => write!(f, "timed out after {}s", after_secs),
            Self::Io { message } => write!(f, "I/O error: {}", message),
        }
    }
}

/// Terminal state of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed { reason: FailureReason },
}

impl Outcome {
    pub fn failed(reason: FailureReason) -> Self {
        Self::Failed { reason }
    }

    /// The boolean completion signal.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Succeeded => None,
            Self::Failed { reason } => Some(reason),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed { reason } => write!(f, "failed ({})", reason),
        }
    }
}

/// Item of an invocation event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvocationEvent {
    Log(LogEvent),
    Finished { outcome: Outcome },
}

impl InvocationEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    pub fn as_log(&self) -> Option<&LogEvent> {
        match self {
            Self::Log(event) => Some(event),
            Self::Finished { .. } => None,
        }
    }

    /// Serialize to a single JSON line for forwarding to a GUI shell.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(line: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(line)?)
    }
}
