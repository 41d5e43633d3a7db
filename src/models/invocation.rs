//! Invocation Models
//!
//! Argument builders and launch plans for the analysis pipeline. The
//! development and packaged argument lists are produced by two separate
//! builders and differ by exactly the leading script path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::utils::paths::AppPaths;

/// Interpreter used to run the pipeline script during development
pub const DEFAULT_INTERPRETER: &str = "python3";
/// Base name of the packaged pipeline executable under `<resources>/python/`
pub const PACKAGED_BINARY_NAME: &str = "process_pipeline";

/// Forces the child's text streams to UTF-8 regardless of console locale
pub const CHILD_ENCODING_ENV: (&str, &str) = ("PYTHONIOENCODING", "utf-8");

/// Logical flags passed to the pipeline, independent of deployment mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineArgs {
    pub config_path: PathBuf,
    pub system_prompt_path: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub input_files: Vec<PathBuf>,
}

impl PipelineArgs {
    pub fn new(config_path: impl Into<PathBuf>, system_prompt_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            system_prompt_path: system_prompt_path.into(),
            output_dir: None,
            input_files: Vec::new(),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn with_input_files(mut self, files: Vec<PathBuf>) -> Self {
        self.input_files = files;
        self
    }

    /// Arguments for the packaged executable, which embeds the script.
    pub fn packaged_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--config-path".into(),
            self.config_path.clone().into_os_string(),
            "--system-prompt-path".into(),
            self.system_prompt_path.clone().into_os_string(),
        ];

        if let Some(ref output_dir) = self.output_dir {
            args.push("--output-dir".into());
            args.push(output_dir.clone().into_os_string());
        }

        if !self.input_files.is_empty() {
            args.push("--input-files".into());
            args.extend(self.input_files.iter().map(|f| f.clone().into_os_string()));
        }

        args
    }

    /// Arguments for the interpreter: the script path, then the packaged flags.
    pub fn dev_args(&self, script: &Path) -> Vec<OsString> {
        let flags = self.packaged_args();
        let mut args = Vec::with_capacity(flags.len() + 1);
        args.push(script.as_os_str().to_os_string());
        args.extend(flags);
        args
    }
}

/// How the pipeline is deployed alongside the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Run the script through an interpreter found on PATH
    Development {
        interpreter: String,
        script: PathBuf,
        root_dir: PathBuf,
    },
    /// Run the compiled pipeline shipped in the resources directory
    Packaged { resources_dir: PathBuf },
}

impl DeploymentMode {
    pub fn development(paths: &AppPaths) -> Self {
        Self::Development {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            script: paths.pipeline_script(),
            root_dir: paths.root_dir.clone(),
        }
    }

    pub fn packaged(resources_dir: impl Into<PathBuf>) -> Self {
        Self::Packaged {
            resources_dir: resources_dir.into(),
        }
    }

    pub fn is_packaged(&self) -> bool {
        matches!(self, Self::Packaged { .. })
    }

    /// Program to execute for this mode
    pub fn executable(&self) -> PathBuf {
        match self {
            Self::Development { interpreter, .. } => PathBuf::from(interpreter),
            Self::Packaged { resources_dir } => resources_dir.join("python").join(format!(
                "{}{}",
                PACKAGED_BINARY_NAME,
                std::env::consts::EXE_SUFFIX
            )),
        }
    }

    /// Directory the child starts in
    pub fn working_dir(&self) -> PathBuf {
        match self {
            Self::Development { root_dir, .. } => root_dir.clone(),
            Self::Packaged { .. } => self
                .executable()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }

    /// Resolve the full launch plan for `args`.
    pub fn launch_plan(&self, args: &PipelineArgs) -> LaunchPlan {
        let argv = match self {
            Self::Development { script, .. } => args.dev_args(script),
            Self::Packaged { .. } => args.packaged_args(),
        };

        LaunchPlan::new(self.executable(), self.working_dir())
            .with_args(argv)
            .with_env(CHILD_ENCODING_ENV.0, CHILD_ENCODING_ENV.1)
    }
}

/// Fully resolved process invocation. Arguments are discrete tokens and are
/// never joined into a shell string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl LaunchPlan {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            env: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Human-readable command line for diagnostics only
    pub fn describe(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}
