//! Test Support
//!
//! Scripted process spawner and recording clock for driving the supervisor
//! without real processes or real delays.

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use konspekt_core::Clock;

use konspekt_desktop::models::invocation::{DeploymentMode, LaunchPlan};
use konspekt_desktop::services::process::{OutputReader, ProcessSpawner, RunningProcess};
use konspekt_desktop::utils::paths::AppPaths;
use konspekt_desktop::{AppContext, AppState, ProcessSupervisor, SupervisorConfig};

// ============================================================================
// Scripted Spawner
// ============================================================================

/// What a scripted process does once spawned
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
    /// Never exit on its own; only a kill ends it
    pub hang: bool,
}

impl Script {
    pub fn exits(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Default::default()
        }
    }

    pub fn hangs() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn with_stdout(mut self, out: impl Into<Vec<u8>>) -> Self {
        self.stdout = out.into();
        self
    }

    pub fn with_stderr(mut self, err: impl Into<Vec<u8>>) -> Self {
        self.stderr = err.into();
        self
    }
}

/// Spawner that fails with queued error kinds, then starts scripted processes
#[derive(Default)]
pub struct ScriptedSpawner {
    failures: Mutex<VecDeque<io::ErrorKind>>,
    /// Fail every spawn with this kind once the queue is empty
    always_fail: Option<io::ErrorKind>,
    script: Script,
    spawns: AtomicUsize,
    plans: Mutex<Vec<LaunchPlan>>,
    killed: Arc<AtomicBool>,
}

impl ScriptedSpawner {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }

    pub fn failing_with(kind: io::ErrorKind) -> Self {
        Self {
            always_fail: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_failures(self, kinds: impl IntoIterator<Item = io::ErrorKind>) -> Self {
        self.failures.lock().unwrap().extend(kinds);
        self
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    pub fn last_plan(&self) -> Option<LaunchPlan> {
        self.plans.lock().unwrap().last().cloned()
    }

    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

impl ProcessSpawner for ScriptedSpawner {
    fn spawn(&self, plan: &LaunchPlan) -> io::Result<Box<dyn RunningProcess>> {
        self.spawns.fetch_add(1, Ordering::SeqCst);
        self.plans.lock().unwrap().push(plan.clone());

        let queued = self.failures.lock().unwrap().pop_front();
        if let Some(kind) = queued.or(self.always_fail) {
            return Err(io::Error::from(kind));
        }

        Ok(Box::new(ScriptedProcess {
            stdout: Some(self.script.stdout.clone()),
            stderr: Some(self.script.stderr.clone()),
            exit_code: self.script.exit_code,
            hang: self.script.hang,
            killed: Arc::clone(&self.killed),
        }))
    }
}

struct ScriptedProcess {
    stdout: Option<Vec<u8>>,
    stderr: Option<Vec<u8>>,
    exit_code: Option<i32>,
    hang: bool,
    killed: Arc<AtomicBool>,
}

#[async_trait]
impl RunningProcess for ScriptedProcess {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn take_stdout(&mut self) -> Option<OutputReader> {
        self.stdout
            .take()
            .map(|bytes| Box::new(io::Cursor::new(bytes)) as OutputReader)
    }

    fn take_stderr(&mut self) -> Option<OutputReader> {
        self.stderr
            .take()
            .map(|bytes| Box::new(io::Cursor::new(bytes)) as OutputReader)
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(self.exit_code)
    }

    async fn kill(&mut self) -> io::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Clocks
// ============================================================================

/// Returns immediately and remembers every requested delay
#[derive(Default)]
pub struct RecordingClock {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.slept().iter().sum()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Never wakes up
pub struct StalledClock;

#[async_trait]
impl Clock for StalledClock {
    async fn sleep(&self, _duration: Duration) {
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn supervisor_with(
    spawner: &Arc<ScriptedSpawner>,
    clock: &Arc<RecordingClock>,
    config: SupervisorConfig,
) -> ProcessSupervisor {
    ProcessSupervisor::new(config)
        .with_spawner(Arc::clone(spawner) as Arc<dyn ProcessSpawner>)
        .with_clock(Arc::clone(clock) as Arc<dyn Clock>)
}

/// App state rooted in `dir`, with user data under `dir/data` and the app root at `dir/app`
pub fn app_state(
    dir: &Path,
    mode: Option<DeploymentMode>,
    supervisor: ProcessSupervisor,
) -> AppState {
    let paths = AppPaths::new(dir.join("data"), dir.join("app"));
    let mode = mode.unwrap_or_else(|| DeploymentMode::development(&paths));
    AppState::with_supervisor(AppContext::new(paths, mode), supervisor).unwrap()
}

pub fn plan() -> LaunchPlan {
    LaunchPlan::new("process_pipeline", "/tmp").with_args(["--config-path", "config.yml"])
}
