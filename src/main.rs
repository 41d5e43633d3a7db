// Konspekt Desktop - command-line front-end
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::EnvFilter;

use konspekt_desktop::commands;
use konspekt_desktop::models::invocation::DeploymentMode;
use konspekt_desktop::models::response::CommandResponse;
use konspekt_desktop::utils::paths::{default_user_data_dir, AppPaths};
use konspekt_desktop::{
    AppContext, AppState, InvocationEvent, LogEvent, LogStream, Outcome, SettingsUpdate,
    SupervisorConfig,
};

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    let _ = set_global_default(subscriber);
}

#[derive(Parser)]
#[command(version, about = "Konspekt: build a timeline from .docx documents")]
struct Opts {
    /// Increase verbosity (-v, -vv). Default WARN.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// User data directory holding config.yml, system_prompt.txt and input_docs/
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Application root with the bundled defaults and pipeline script
    #[arg(long, global = true)]
    root_dir: Option<PathBuf>,

    /// Run the compiled pipeline instead of the development script
    #[arg(long, global = true)]
    packaged: bool,

    /// Resources directory of a packaged install (defaults to <root-dir>/resources)
    #[arg(long, global = true)]
    resources_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stage documents and run the analysis pipeline over them
    Run {
        /// Input files; only .docx files are processed
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Kill the pipeline after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Inspect or change the settings document
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Inspect or replace the system prompt
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },
    /// Print the location of the generated timeline page
    Viz,
    /// Detect a local Ollama install
    CheckOllama,
    /// Pull application updates
    CheckUpdate,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Set or clear the pipeline output directory
    SetOutput {
        path: Option<PathBuf>,
        #[arg(long, conflicts_with = "path")]
        clear: bool,
    },
    /// Change LLM connection settings
    SetLlm {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
        /// Pass an empty value to remove the key
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Subcommand)]
enum PromptAction {
    /// Print the system prompt
    Show,
    /// Replace the system prompt with the contents of a file
    Set { file: PathBuf },
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    init_tracing(opts.verbose);

    match run(opts).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn build_context(opts: &Opts, timeout: Option<u64>) -> anyhow::Result<AppContext> {
    let root_dir = match &opts.root_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Could not read the current directory")?,
    };
    let data_dir = match &opts.data_dir {
        Some(dir) => dir.clone(),
        None => default_user_data_dir()?,
    };

    let paths = AppPaths::new(data_dir, root_dir);
    let mode = if opts.packaged {
        let resources = opts
            .resources_dir
            .clone()
            .unwrap_or_else(|| paths.root_dir.join("resources"));
        DeploymentMode::packaged(resources)
    } else {
        DeploymentMode::development(&paths)
    };

    let mut supervisor = SupervisorConfig::default();
    if let Some(secs) = timeout {
        supervisor = supervisor.with_timeout(Duration::from_secs(secs));
    }

    Ok(AppContext::new(paths, mode).with_supervisor_config(supervisor))
}

async fn run(opts: Opts) -> anyhow::Result<bool> {
    let timeout = match &opts.command {
        Command::Run { timeout, .. } => *timeout,
        _ => None,
    };
    let state = AppState::initialize(build_context(&opts, timeout)?)?;

    match opts.command {
        Command::Run { files, json, .. } => {
            let outcome = run_pipeline(&state, files, json).await?;
            Ok(outcome.is_success())
        }
        Command::Config { action } => match action {
            ConfigAction::Show => print_json(commands::get_config(&state).await),
            ConfigAction::SetOutput { path, clear } => {
                let update = SettingsUpdate {
                    output_path: path.map(|p| p.to_string_lossy().to_string()),
                    clear_output_path: clear,
                    ..Default::default()
                };
                print_json(commands::update_settings(&state, update).await)
            }
            ConfigAction::SetLlm {
                provider,
                model,
                api_key,
                base_url,
            } => {
                let update = SettingsUpdate {
                    provider,
                    model,
                    api_key,
                    base_url,
                    ..Default::default()
                };
                print_json(commands::update_settings(&state, update).await)
            }
        },
        Command::Prompt { action } => match action {
            PromptAction::Show => {
                let response = commands::get_prompt(&state).await;
                if let Some(prompt) = &response.data {
                    println!("{}", prompt);
                }
                Ok(response.success)
            }
            PromptAction::Set { file } => {
                let content = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                print_json(commands::save_prompt(&state, content).await)
            }
        },
        Command::Viz => {
            let response = commands::open_visualization(&state).await;
            match (&response.data, &response.error) {
                (Some(path), _) => println!("{}", path.display()),
                (None, Some(error)) => eprintln!("{}", error),
                (None, None) => {}
            }
            Ok(response.success)
        }
        Command::CheckOllama => print_json(commands::check_ollama().await),
        Command::CheckUpdate => {
            let response = commands::check_update(&state).await;
            let success = response.data.as_ref().is_some_and(|s| s.success);
            print_json(response)?;
            Ok(success)
        }
    }
}

/// Stream one invocation to the terminal; Ctrl-C cancels the child.
async fn run_pipeline(
    state: &AppState,
    files: Vec<PathBuf>,
    json: bool,
) -> anyhow::Result<Outcome> {
    let mut handle = commands::run_process(state, files);
    let mut interrupted = false;

    loop {
        let event = tokio::select! {
            event = handle.next_event() => event,
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                handle.cancel();
                continue;
            }
        };

        let Some(event) = event else {
            anyhow::bail!("invocation {} ended without an outcome", handle.id());
        };

        if json {
            println!("{}", event.to_json()?);
        }

        match event {
            InvocationEvent::Log(log) => {
                if !json {
                    print_log(&log);
                }
            }
            InvocationEvent::Finished { outcome } => {
                if !json {
                    println!("{} {}", timestamp(), outcome);
                }
                return Ok(outcome);
            }
        }
    }
}

fn print_log(log: &LogEvent) {
    let text = log.text.trim_end_matches(['\r', '\n']);
    if text.is_empty() {
        return;
    }
    match log.stream {
        LogStream::Stderr => eprintln!("{} {}", timestamp(), text),
        LogStream::Stdout | LogStream::Supervisor => println!("{} {}", timestamp(), text),
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("[%H:%M:%S]").to_string()
}

fn print_json<T: serde::Serialize>(response: CommandResponse<T>) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.success)
}
