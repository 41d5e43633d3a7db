//! Process Supervisor
//!
//! Runs one launch plan to completion: spawn with bounded retry on transient
//! OS errors, forward stdout/stderr chunks as they arrive, and translate the
//! exit into exactly one [`Outcome`].

use std::sync::Arc;
use std::time::Duration;

use konspekt_core::{Clock, FailureReason, LogStream, Outcome};
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::classify::{classify_spawn_error, describe_spawn_error, SpawnErrorClass};
use super::clock::TokioClock;
use super::decode::Utf8ChunkDecoder;
use super::emitter::{invocation_channel, InvocationHandle, LogSink};
use super::spawner::{OutputReader, ProcessSpawner, RunningProcess, TokioSpawner};
use crate::models::invocation::LaunchPlan;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Supervisor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Respawns allowed after transient spawn failures
    pub max_retries: u32,
    /// Delay before each respawn
    pub retry_backoff: Duration,
    /// Kill the child if it runs longer than this
    pub timeout: Option<Duration>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            timeout: None,
        }
    }
}

impl SupervisorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// How the wait on a live child ended
enum Ended {
    Exited(std::io::Result<Option<i32>>),
    Cancelled,
    TimedOut(Duration),
}

/// Supervises analysis pipeline processes.
///
/// Cloning is cheap; clones share the spawner and clock but no invocation
/// state.
#[derive(Clone)]
pub struct ProcessSupervisor {
    spawner: Arc<dyn ProcessSpawner>,
    clock: Arc<dyn Clock>,
    config: SupervisorConfig,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

impl ProcessSupervisor {
    /// Create a supervisor that spawns real processes and sleeps on the tokio timer
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            spawner: Arc::new(TokioSpawner),
            clock: Arc::new(TokioClock),
            config,
        }
    }

    pub fn with_spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Start `plan` in the background and return its event stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self, plan: LaunchPlan) -> InvocationHandle {
        let (emitter, handle) = invocation_channel();
        let cancel = handle.cancellation_token();
        let supervisor = self.clone();

        tokio::spawn(async move {
            let outcome = supervisor.supervise(&plan, emitter.logs(), &cancel).await;
            emitter.finish(outcome);
        });

        handle
    }

    /// Run `plan` to completion, writing log events to `logs`.
    ///
    /// The returned outcome is the only terminal result of the invocation;
    /// callers deliver it after this future resolves.
    pub async fn supervise(
        &self,
        plan: &LaunchPlan,
        logs: &LogSink,
        cancel: &CancellationToken,
    ) -> Outcome {
        let mut retries_left = self.config.max_retries;
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                logs.supervisor("Process cancelled");
                return Outcome::failed(FailureReason::Cancelled);
            }

            attempts += 1;
            tracing::info!("Spawning (attempt {}): {}", attempts, plan.describe());

            let error = match self.spawner.spawn(plan) {
                Ok(process) => return self.drive(process, logs, cancel).await,
                Err(error) => error,
            };

            let message = describe_spawn_error(&error, &plan.program);
            tracing::warn!("Spawn error: {}", message);

            match classify_spawn_error(&error) {
                SpawnErrorClass::Transient if retries_left > 0 => {
                    logs.supervisor(format!(
                        "System busy (EAGAIN), retrying in {}... ({} left)",
                        format_duration(self.config.retry_backoff),
                        retries_left
                    ));
                    tokio::select! {
                        _ = self.clock.sleep(self.config.retry_backoff) => {}
                        _ = cancel.cancelled() => {
                            logs.supervisor("Process cancelled");
                            return Outcome::failed(FailureReason::Cancelled);
                        }
                    }
                    retries_left -= 1;
                }
                SpawnErrorClass::Transient => {
                    logs.supervisor(critical_spawn_message(&message));
                    return Outcome::failed(FailureReason::SpawnRetriesExhausted {
                        attempts,
                        message,
                    });
                }
                SpawnErrorClass::Fatal => {
                    logs.supervisor(critical_spawn_message(&message));
                    return Outcome::failed(FailureReason::SpawnFailed { message });
                }
            }
        }
    }

    /// Forward output from a live child until it exits, is cancelled or times out.
    async fn drive(
        &self,
        mut process: Box<dyn RunningProcess>,
        logs: &LogSink,
        cancel: &CancellationToken,
    ) -> Outcome {
        tracing::debug!("Pipeline process started (pid {:?})", process.pid());

        let mut readers = [
            spawn_forwarder(process.take_stdout(), LogStream::Stdout, logs),
            spawn_forwarder(process.take_stderr(), LogStream::Stderr, logs),
        ];

        let clock = Arc::clone(&self.clock);
        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => {
                    clock.sleep(limit).await;
                    limit
                }
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let ended = tokio::select! {
            status = process.wait() => Ended::Exited(status),
            _ = cancel.cancelled() => Ended::Cancelled,
            limit = &mut deadline => Ended::TimedOut(limit),
        };

        // Every chunk must be delivered before the outcome. A descendant of
        // the child can hold the pipes open, so draining stays cancellable.
        let ended = match ended {
            Ended::Exited(status) => tokio::select! {
                _ = join_readers(&mut readers) => Ended::Exited(status),
                _ = cancel.cancelled() => Ended::Cancelled,
                limit = &mut deadline => Ended::TimedOut(limit),
            },
            other => other,
        };

        match ended {
            Ended::Exited(status) => match status {
                Ok(Some(0)) => {
                    logs.supervisor("Processing Complete!");
                    Outcome::Succeeded
                }
                Ok(Some(code)) => {
                    logs.supervisor(format!("Process exited with code {}", code));
                    Outcome::failed(FailureReason::ExitCode { code })
                }
                Ok(None) => {
                    logs.supervisor("Process terminated without an exit code");
                    Outcome::failed(FailureReason::Terminated)
                }
                Err(e) => {
                    logs.supervisor(format!(
                        "CRITICAL ERROR: Lost track of pipeline process. {}",
                        e
                    ));
                    Outcome::failed(FailureReason::Io {
                        message: e.to_string(),
                    })
                }
            },
            Ended::Cancelled => {
                stop(process, &mut readers).await;
                logs.supervisor("Process cancelled");
                Outcome::failed(FailureReason::Cancelled)
            }
            Ended::TimedOut(limit) => {
                stop(process, &mut readers).await;
                logs.supervisor(format!("Process timed out after {}", format_duration(limit)));
                Outcome::failed(FailureReason::TimedOut {
                    after_secs: limit.as_secs(),
                })
            }
        }
    }
}

fn critical_spawn_message(detail: &str) -> String {
    format!("CRITICAL ERROR: Failed to start pipeline process. {}", detail)
}

fn spawn_forwarder(
    reader: Option<OutputReader>,
    stream: LogStream,
    logs: &LogSink,
) -> Option<JoinHandle<()>> {
    reader.map(|reader| tokio::spawn(forward_output(reader, stream, logs.clone())))
}

/// Read `reader` to EOF, forwarding each decoded chunk immediately.
async fn forward_output(mut reader: OutputReader, stream: LogStream, logs: LogSink) {
    let mut decoder = Utf8ChunkDecoder::new();
    let mut buf = vec![0u8; READ_CHUNK_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let text = decoder.decode(&buf[..n]);
                if !text.is_empty() {
                    logs.emit(stream, text);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read child {}: {}", stream, e);
                break;
            }
        }
    }

    if let Some(tail) = decoder.finish() {
        logs.emit(stream, tail);
    }
}

/// Wait for every reader task that is still running.
async fn join_readers(readers: &mut [Option<JoinHandle<()>>; 2]) {
    for slot in readers.iter_mut() {
        if let Some(task) = slot.as_mut() {
            if let Err(e) = task.await {
                tracing::warn!("Output reader task failed: {}", e);
            }
            *slot = None;
        }
    }
}

async fn stop(mut process: Box<dyn RunningProcess>, readers: &mut [Option<JoinHandle<()>>; 2]) {
    if let Err(e) = process.kill().await {
        tracing::warn!("Failed to kill pipeline process: {}", e);
    }
    for task in readers.iter_mut().filter_map(Option::take) {
        task.abort();
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
