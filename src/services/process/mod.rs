//! Pipeline Process Service
//!
//! Supervised execution of the external analysis pipeline: spawning with
//! transient-error retry, streamed output forwarding, and a single terminal
//! outcome per invocation.

pub mod classify;
pub mod clock;
pub mod decode;
pub mod emitter;
pub mod spawner;
pub mod supervisor;

pub use classify::{classify_spawn_error, describe_spawn_error, SpawnErrorClass};
pub use clock::TokioClock;
pub use decode::Utf8ChunkDecoder;
pub use emitter::{invocation_channel, InvocationEmitter, InvocationHandle, LogSink};
pub use spawner::{ChildProcess, OutputReader, ProcessSpawner, RunningProcess, TokioSpawner};
pub use supervisor::{
    ProcessSupervisor, SupervisorConfig, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BACKOFF,
};
