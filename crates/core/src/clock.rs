//! Clock Abstraction
//!
//! The supervisor never calls a timer directly. Retry backoff and run
//! timeouts go through [`Clock`] so tests can observe and skip the waits.

use std::time::Duration;

use async_trait::async_trait;

/// Source of asynchronous delays.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}
