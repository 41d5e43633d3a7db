//! Invocation Event Channel
//!
//! Each invocation owns one unbounded channel. Producers hold a cloneable
//! [`LogSink`]; the single [`InvocationEmitter`] is consumed by
//! [`InvocationEmitter::finish`], so the terminal outcome can be sent only once.
//! Consumers read an [`InvocationHandle`], which is also a `Stream`.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use konspekt_core::{FailureReason, InvocationEvent, LogEvent, LogStream, Outcome};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

/// Create the producer and consumer ends for a new invocation.
pub fn invocation_channel() -> (InvocationEmitter, InvocationHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = uuid::Uuid::new_v4().to_string();
    let cancel = CancellationToken::new();

    let emitter = InvocationEmitter {
        sink: LogSink {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        },
    };
    let handle = InvocationHandle {
        id,
        events: UnboundedReceiverStream::new(rx),
        cancel,
    };
    (emitter, handle)
}

/// Cloneable producer of log events for one invocation
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: mpsc::UnboundedSender<InvocationEvent>,
    seq: Arc<AtomicU64>,
}

impl LogSink {
    pub fn emit(&self, stream: LogStream, chunk: impl AsRef<str>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let event = LogEvent::new(seq, stream, chunk);
        if self.tx.send(InvocationEvent::Log(event)).is_err() {
            tracing::debug!("Invocation consumer dropped, discarding log event {}", seq);
        }
    }

    /// Message produced by the supervisor or runner itself
    pub fn supervisor(&self, message: impl AsRef<str>) {
        self.emit(LogStream::Supervisor, message);
    }
}

/// Owner of the terminal signal for one invocation
#[derive(Debug)]
pub struct InvocationEmitter {
    sink: LogSink,
}

impl InvocationEmitter {
    pub fn logs(&self) -> &LogSink {
        &self.sink
    }

    /// Deliver the outcome and close this end of the channel.
    pub fn finish(self, outcome: Outcome) {
        tracing::info!("Invocation finished: {}", outcome);
        if self.sink.tx.send(InvocationEvent::Finished { outcome }).is_err() {
            tracing::debug!("Invocation consumer dropped before the outcome was delivered");
        }
    }
}

/// Consumer end of an invocation: its event stream and cancellation control
#[derive(Debug)]
pub struct InvocationHandle {
    id: String,
    events: UnboundedReceiverStream<InvocationEvent>,
    cancel: CancellationToken,
}

impl InvocationHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request that the running process be killed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn next_event(&mut self) -> Option<InvocationEvent> {
        self.events.next().await
    }

    /// Drain the stream, passing each log event to `on_log`, and return the outcome.
    pub async fn wait_with_logs<F>(mut self, mut on_log: F) -> Outcome
    where
        F: FnMut(&LogEvent),
    {
        while let Some(event) = self.next_event().await {
            match event {
                InvocationEvent::Log(log) => on_log(&log),
                InvocationEvent::Finished { outcome } => return outcome,
            }
        }
        Outcome::failed(FailureReason::Io {
            message: "invocation ended without an outcome".to_string(),
        })
    }

    /// Drain the stream, returning all log events and the outcome.
    pub async fn collect_logs(self) -> (Vec<LogEvent>, Outcome) {
        let mut logs = Vec::new();
        let outcome = self.wait_with_logs(|log| logs.push(log.clone())).await;
        (logs, outcome)
    }
}

impl Stream for InvocationHandle {
    type Item = InvocationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}
