//! Pipeline Runner Integration Tests
//!
//! The run-process flow end to end: staging, argument assembly from the
//! persisted settings and the supervised run, with a scripted spawner.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use konspekt_desktop::commands::{run_process, update_settings};
use konspekt_desktop::models::invocation::DeploymentMode;
use konspekt_desktop::{FailureReason, LogStream, SettingsUpdate, SupervisorConfig};

use crate::support::{app_state, supervisor_with, RecordingClock, Script, ScriptedSpawner};

// ============================================================================
// Helper Functions
// ============================================================================

fn write_inputs(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    let inbox = dir.join("inbox");
    fs::create_dir_all(&inbox).unwrap();
    names
        .iter()
        .map(|name| {
            let path = inbox.join(name);
            fs::write(&path, format!("contents of {}", name)).unwrap();
            path
        })
        .collect()
}

fn position(args: &[OsString], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
}

// ============================================================================
// Staging
// ============================================================================

#[tokio::test]
async fn test_two_docx_files_are_staged_and_run() {
    let dir = TempDir::new().unwrap();
    let spawner = Arc::new(ScriptedSpawner::new(Script::exits(0).with_stdout("ok\n")));
    let clock = Arc::new(RecordingClock::default());
    let state = app_state(
        dir.path(),
        None,
        supervisor_with(&spawner, &clock, SupervisorConfig::default()),
    );

    let files = write_inputs(dir.path(), &["a.docx", "b.DOCX", "notes.txt"]);
    let (logs, outcome) = run_process(&state, files).collect_logs().await;

    assert!(outcome.is_success());
    assert_eq!(logs[0].stream, LogStream::Supervisor);
    assert!(logs[0].contains("Copied 2 files"));

    let staging = state.paths().input_docs_dir();
    assert_eq!(
        fs::read_to_string(staging.join("a.docx")).unwrap(),
        "contents of a.docx"
    );
    assert!(staging.join("b.DOCX").is_file());
    assert!(!staging.join("notes.txt").exists());

    let plan = spawner.last_plan().unwrap();
    let start = position(&plan.args, "--input-files").unwrap();
    let inputs: Vec<PathBuf> = plan.args[start + 1..].iter().map(PathBuf::from).collect();
    assert_eq!(inputs, vec![staging.join("a.docx"), staging.join("b.DOCX")]);
}

#[tokio::test]
async fn test_no_docx_files_never_spawns() {
    let dir = TempDir::new().unwrap();
    let spawner = Arc::new(ScriptedSpawner::new(Script::exits(0)));
    let clock = Arc::new(RecordingClock::default());
    let state = app_state(
        dir.path(),
        None,
        supervisor_with(&spawner, &clock, SupervisorConfig::default()),
    );

    let files = write_inputs(dir.path(), &["scan.pdf", "notes.doc"]);
    let (logs, outcome) = run_process(&state, files).collect_logs().await;

    assert_eq!(outcome.failure_reason(), Some(&FailureReason::NoInputFiles));
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].text, "No .docx files found to process.");
    assert_eq!(spawner.spawn_count(), 0);
}

#[tokio::test]
async fn test_missing_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let spawner = Arc::new(ScriptedSpawner::new(Script::exits(0)));
    let clock = Arc::new(RecordingClock::default());
    let state = app_state(
        dir.path(),
        None,
        supervisor_with(&spawner, &clock, SupervisorConfig::default()),
    );

    let mut files = write_inputs(dir.path(), &["present.docx"]);
    files.push(dir.path().join("inbox").join("gone.docx"));
    let (logs, outcome) = run_process(&state, files).collect_logs().await;

    assert!(outcome.is_success());
    assert!(logs
        .iter()
        .any(|l| l.contains("Skipping missing file") && l.contains("gone.docx")));
    assert!(logs.iter().any(|l| l.contains("Copied 1 files")));
}

#[tokio::test]
async fn test_namesakes_from_different_folders_are_all_processed() {
    let dir = TempDir::new().unwrap();
    let spawner = Arc::new(ScriptedSpawner::new(Script::exits(0)));
    let clock = Arc::new(RecordingClock::default());
    let state = app_state(
        dir.path(),
        None,
        supervisor_with(&spawner, &clock, SupervisorConfig::default()),
    );

    let mut files = Vec::new();
    for folder in ["x", "y"] {
        let folder = dir.path().join(folder);
        fs::create_dir_all(&folder).unwrap();
        let path = folder.join("a.docx");
        fs::write(&path, format!("from {}", folder.display())).unwrap();
        files.push(path);
    }

    let (logs, outcome) = run_process(&state, files).collect_logs().await;

    assert!(outcome.is_success());
    assert!(logs
        .iter()
        .any(|l| l.contains("Duplicate file name") && l.contains("a (2).docx")));
    assert!(logs.iter().any(|l| l.contains("Copied 2 files")));

    let staging = state.paths().input_docs_dir();
    let plan = spawner.last_plan().unwrap();
    let start = position(&plan.args, "--input-files").unwrap();
    let inputs: Vec<PathBuf> = plan.args[start + 1..].iter().map(PathBuf::from).collect();
    assert_eq!(inputs, vec![staging.join("a.docx"), staging.join("a (2).docx")]);
}

#[tokio::test]
async fn test_empty_selection_fails_without_spawning() {
    let dir = TempDir::new().unwrap();
    let spawner = Arc::new(ScriptedSpawner::new(Script::exits(0)));
    let clock = Arc::new(RecordingClock::default());
    let state = app_state(
        dir.path(),
        None,
        supervisor_with(&spawner, &clock, SupervisorConfig::default()),
    );

    let (_, outcome) = run_process(&state, Vec::new()).collect_logs().await;
    assert_eq!(outcome.failure_reason(), Some(&FailureReason::NoInputFiles));
    assert_eq!(spawner.spawn_count(), 0);
}

// ============================================================================
// Argument Assembly
// ============================================================================

#[tokio::test]
async fn test_development_arguments() {
    let dir = TempDir::new().unwrap();
    let spawner = Arc::new(ScriptedSpawner::new(Script::exits(0)));
    let clock = Arc::new(RecordingClock::default());
    let state = app_state(
        dir.path(),
        None,
        supervisor_with(&spawner, &clock, SupervisorConfig::default()),
    );

    let files = write_inputs(dir.path(), &["a.docx"]);
    run_process(&state, files).collect_logs().await;

    let plan = spawner.last_plan().unwrap();
    let paths = state.paths();
    assert_eq!(plan.program, PathBuf::from("python3"));
    assert_eq!(plan.working_dir, paths.root_dir);
    assert_eq!(PathBuf::from(&plan.args[0]), paths.pipeline_script());
    assert_eq!(
        PathBuf::from(&plan.args[position(&plan.args, "--config-path").unwrap() + 1]),
        paths.config_path()
    );
    assert_eq!(
        PathBuf::from(&plan.args[position(&plan.args, "--system-prompt-path").unwrap() + 1]),
        paths.prompt_path()
    );
    assert!(position(&plan.args, "--output-dir").is_none());
    assert!(plan
        .env
        .contains(&("PYTHONIOENCODING".to_string(), "utf-8".to_string())));
}

#[tokio::test]
async fn test_packaged_arguments_with_output_dir() {
    let dir = TempDir::new().unwrap();
    let resources = dir.path().join("resources");
    let spawner = Arc::new(ScriptedSpawner::new(Script::exits(0)));
    let clock = Arc::new(RecordingClock::default());
    let state = app_state(
        dir.path(),
        Some(DeploymentMode::packaged(&resources)),
        supervisor_with(&spawner, &clock, SupervisorConfig::default()),
    );

    let out = dir.path().join("timeline out");
    let response = update_settings(
        &state,
        SettingsUpdate {
            output_path: Some(out.to_string_lossy().to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(response.success);

    let files = write_inputs(dir.path(), &["a.docx"]);
    let (logs, outcome) = run_process(&state, files).collect_logs().await;
    assert!(outcome.is_success());
    assert!(logs
        .iter()
        .any(|l| l.contains("Using Output Directory") && l.contains("timeline out")));

    let plan = spawner.last_plan().unwrap();
    let exe = format!("process_pipeline{}", std::env::consts::EXE_SUFFIX);
    assert_eq!(plan.program, resources.join("python").join(exe));
    assert_eq!(plan.working_dir, resources.join("python"));
    assert_eq!(plan.args[0], "--config-path");
    assert_eq!(
        PathBuf::from(&plan.args[position(&plan.args, "--output-dir").unwrap() + 1]),
        out
    );
}

#[tokio::test]
async fn test_pipeline_failure_surfaces_exit_code() {
    let dir = TempDir::new().unwrap();
    let spawner = Arc::new(ScriptedSpawner::new(
        Script::exits(1).with_stderr("KeyError: 'llm_settings'\n"),
    ));
    let clock = Arc::new(RecordingClock::default());
    let state = app_state(
        dir.path(),
        None,
        supervisor_with(&spawner, &clock, SupervisorConfig::default()),
    );

    let files = write_inputs(dir.path(), &["a.docx"]);
    let (logs, outcome) = run_process(&state, files).collect_logs().await;

    assert_eq!(outcome.failure_reason(), Some(&FailureReason::ExitCode { code: 1 }));
    assert!(logs
        .iter()
        .any(|l| l.stream == LogStream::Stderr && l.text == "ERROR: KeyError: 'llm_settings'\n"));
}
