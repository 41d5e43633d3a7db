//! Pipeline Process Spawning
//!
//! Handles spawning the analysis process and exposes it through the
//! [`RunningProcess`] seam so the supervisor can be driven by scripted
//! processes in tests.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use crate::models::invocation::LaunchPlan;

/// Readable end of a child's output pipe
pub type OutputReader = Box<dyn AsyncRead + Send + Unpin>;

/// Handle to a started process
#[async_trait]
pub trait RunningProcess: Send {
    /// Process ID for identification
    fn pid(&self) -> Option<u32>;

    /// Take the stdout handle (can only be called once)
    fn take_stdout(&mut self) -> Option<OutputReader>;

    /// Take the stderr handle (can only be called once)
    fn take_stderr(&mut self) -> Option<OutputReader>;

    /// Wait for the process to exit and return its exit code, if it has one
    async fn wait(&mut self) -> io::Result<Option<i32>>;

    /// Kill the process
    async fn kill(&mut self) -> io::Result<()>;
}

/// Creates one OS process per call.
pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, plan: &LaunchPlan) -> io::Result<Box<dyn RunningProcess>>;
}

/// Spawner backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, plan: &LaunchPlan) -> io::Result<Box<dyn RunningProcess>> {
        let mut cmd = Command::new(&plan.program);
        cmd.args(&plan.args);

        if !plan.working_dir.as_os_str().is_empty() {
            cmd.current_dir(&plan.working_dir);
        }

        for (key, value) in &plan.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd.spawn()?;
        let pid = child.id();

        Ok(Box::new(ChildProcess { child, pid }))
    }
}

/// Handle to a running pipeline process
pub struct ChildProcess {
    child: Child,
    pid: Option<u32>,
}

#[async_trait]
impl RunningProcess for ChildProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn take_stdout(&mut self) -> Option<OutputReader> {
        self.child
            .stdout
            .take()
            .map(|stdout| Box::new(stdout) as OutputReader)
    }

    fn take_stderr(&mut self) -> Option<OutputReader> {
        self.child
            .stderr
            .take()
            .map(|stderr| Box::new(stderr) as OutputReader)
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        let status = self.child.wait().await?;

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                tracing::warn!(pid = ?self.pid, signal, "pipeline process killed by signal");
            }
        }

        Ok(status.code())
    }

    async fn kill(&mut self) -> io::Result<()> {
        self.child.kill().await
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        // A supervisor that is dropped mid-run must not leave the child behind
        let _ = self.child.start_kill();
    }
}
