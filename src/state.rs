//! Application State
//!
//! The explicit application context and the services built from it. One
//! `AppState` is created at start-up and passed to every command.

use std::path::PathBuf;

use crate::models::invocation::DeploymentMode;
use crate::services::pipeline::PipelineRunner;
use crate::services::process::{ProcessSupervisor, SupervisorConfig};
use crate::storage::{ConfigService, PromptStore};
use crate::utils::error::AppResult;
use crate::utils::paths::{default_user_data_dir, ensure_dir, AppPaths};

/// Start-up parameters for one application instance
#[derive(Debug, Clone)]
pub struct AppContext {
    pub paths: AppPaths,
    pub mode: DeploymentMode,
    pub supervisor: SupervisorConfig,
}

impl AppContext {
    pub fn new(paths: AppPaths, mode: DeploymentMode) -> Self {
        Self {
            paths,
            mode,
            supervisor: SupervisorConfig::default(),
        }
    }

    /// Development context rooted at `root_dir`, using the platform user-data directory
    pub fn development(root_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let paths = AppPaths::new(default_user_data_dir()?, root_dir);
        let mode = DeploymentMode::development(&paths);
        Ok(Self::new(paths, mode))
    }

    pub fn with_supervisor_config(mut self, config: SupervisorConfig) -> Self {
        self.supervisor = config;
        self
    }
}

/// Application state holding every service
pub struct AppState {
    context: AppContext,
    config: ConfigService,
    prompts: PromptStore,
    runner: PipelineRunner,
}

impl AppState {
    /// Prepare the user-data directory and build all services
    pub fn initialize(context: AppContext) -> AppResult<Self> {
        let supervisor = ProcessSupervisor::new(context.supervisor.clone());
        Self::with_supervisor(context, supervisor)
    }

    /// Like [`AppState::initialize`], with a caller-supplied supervisor
    pub fn with_supervisor(context: AppContext, supervisor: ProcessSupervisor) -> AppResult<Self> {
        let paths = &context.paths;
        ensure_dir(&paths.user_data_dir)?;

        let config = ConfigService::new(paths.config_path());
        config.seed_from(&paths.bundled_config())?;

        let prompts = PromptStore::new(paths.prompt_path());
        prompts.seed_from(&paths.bundled_prompt())?;

        let runner = PipelineRunner::new(
            paths.clone(),
            context.mode.clone(),
            config.clone(),
            supervisor,
        );

        tracing::info!(
            "Initialized with user data at {} ({} mode)",
            paths.user_data_dir.display(),
            if context.mode.is_packaged() { "packaged" } else { "development" }
        );

        Ok(Self {
            context,
            config,
            prompts,
            runner,
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn paths(&self) -> &AppPaths {
        &self.context.paths
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    pub fn prompts(&self) -> &PromptStore {
        &self.prompts
    }

    pub fn runner(&self) -> &PipelineRunner {
        &self.runner
    }

    /// Check if the config service is healthy
    pub fn is_config_healthy(&self) -> bool {
        self.config.is_healthy()
    }
}
