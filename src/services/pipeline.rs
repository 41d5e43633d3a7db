//! Pipeline Runner
//!
//! The "run-process" flow: stage the dropped documents, assemble the
//! pipeline arguments from the persisted settings, and hand the launch plan
//! to the supervisor. Staging messages and process output share one event
//! stream.

use std::path::PathBuf;

use konspekt_core::{FailureReason, Outcome};
use tokio_util::sync::CancellationToken;

use crate::models::invocation::{DeploymentMode, LaunchPlan, PipelineArgs};
use crate::services::process::{invocation_channel, InvocationHandle, LogSink, ProcessSupervisor};
use crate::services::staging::FileStager;
use crate::storage::ConfigService;
use crate::utils::paths::AppPaths;

#[derive(Clone)]
pub struct PipelineRunner {
    paths: AppPaths,
    mode: DeploymentMode,
    config: ConfigService,
    stager: FileStager,
    supervisor: ProcessSupervisor,
}

impl PipelineRunner {
    pub fn new(
        paths: AppPaths,
        mode: DeploymentMode,
        config: ConfigService,
        supervisor: ProcessSupervisor,
    ) -> Self {
        let stager = FileStager::new(paths.input_docs_dir());
        Self {
            paths,
            mode,
            config,
            stager,
            supervisor,
        }
    }

    pub fn mode(&self) -> &DeploymentMode {
        &self.mode
    }

    /// Start an invocation for `files` in the background.
    pub fn start(&self, files: Vec<PathBuf>) -> InvocationHandle {
        let (emitter, handle) = invocation_channel();
        let cancel = handle.cancellation_token();
        let runner = self.clone();

        tracing::info!("Starting invocation {} with {} input(s)", handle.id(), files.len());
        tokio::spawn(async move {
            let outcome = runner.execute(&files, emitter.logs(), &cancel).await;
            emitter.finish(outcome);
        });

        handle
    }

    /// Run one invocation to completion and return its outcome.
    pub async fn execute(
        &self,
        files: &[PathBuf],
        logs: &LogSink,
        cancel: &CancellationToken,
    ) -> Outcome {
        let report = match self.stager.stage(files).await {
            Ok(report) => report,
            Err(e) => {
                logs.supervisor(format!("CRITICAL ERROR: Failed to stage input files. {}", e));
                return Outcome::failed(FailureReason::Io {
                    message: e.to_string(),
                });
            }
        };

        for missing in &report.missing {
            logs.supervisor(format!("Skipping missing file: {}", missing.display()));
        }

        for (input, staged) in &report.renamed {
            logs.supervisor(format!(
                "Duplicate file name: {} staged as {}",
                input.display(),
                staged.display()
            ));
        }

        if report.is_empty() {
            logs.supervisor("No .docx files found to process.");
            return Outcome::failed(FailureReason::NoInputFiles);
        }

        logs.supervisor(format!(
            "Copied {} files. Starting pipeline...",
            report.staged.len()
        ));

        let mut args = PipelineArgs::new(self.paths.config_path(), self.paths.prompt_path())
            .with_input_files(report.staged);

        if let Some(output_dir) = self.config.output_dir() {
            logs.supervisor(format!("Using Output Directory: {}", output_dir.display()));
            args = args.with_output_dir(output_dir);
        }

        let plan = self.launch_plan(&args);
        self.supervisor.supervise(&plan, logs, cancel).await
    }

    pub fn launch_plan(&self, args: &PipelineArgs) -> LaunchPlan {
        self.mode.launch_plan(args)
    }
}
