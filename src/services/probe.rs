//! Environment Probes
//!
//! One-shot commands whose output feeds the settings screen: detecting a
//! local Ollama install and pulling application updates.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::models::response::{OllamaStatus, UpdateStatus};

/// List locally installed Ollama models.
pub async fn check_ollama() -> OllamaStatus {
    check_ollama_with("ollama").await
}

/// Same as [`check_ollama`], with an explicit program path
pub async fn check_ollama_with(program: impl AsRef<std::ffi::OsStr>) -> OllamaStatus {
    let output = Command::new(program)
        .arg("list")
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => OllamaStatus {
            installed: true,
            models: parse_ollama_list(&String::from_utf8_lossy(&output.stdout)),
        },
        Ok(output) => {
            tracing::debug!("ollama list exited with {:?}", output.status.code());
            OllamaStatus::default()
        }
        Err(e) => {
            tracing::debug!("ollama not available: {}", e);
            OllamaStatus::default()
        }
    }
}

/// Extract model names from `ollama list` output (header line skipped).
pub fn parse_ollama_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Pull the latest application sources into `root`.
pub async fn check_update(root: &Path) -> UpdateStatus {
    run_git_pull("git", root).await
}

async fn run_git_pull(git: &str, root: &Path) -> UpdateStatus {
    let output = Command::new(git)
        .args(["pull", "origin", "main"])
        .current_dir(root)
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let message = if stdout.is_empty() {
                String::from_utf8_lossy(&output.stderr).trim().to_string()
            } else {
                stdout
            };
            UpdateStatus {
                success: true,
                message,
            }
        }
        Ok(output) => UpdateStatus {
            success: false,
            message: format!(
                "git pull failed (exit code {}): {}",
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        },
        Err(e) => UpdateStatus {
            success: false,
            message: format!("Failed to run git: {}", e),
        },
    }
}
