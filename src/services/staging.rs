//! Input Document Staging
//!
//! Copies user-selected `.docx` files into the staging directory the
//! pipeline reads from.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::utils::error::AppResult;

/// Extension accepted for staging (compared ASCII case-insensitively)
pub const STAGED_EXTENSION: &str = "docx";

/// What happened to each requested input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    /// Paths inside the staging directory, in request order
    pub staged: Vec<PathBuf>,
    /// Inputs ignored because they are not `.docx`
    pub skipped: Vec<PathBuf>,
    /// `.docx` inputs that do not exist
    pub missing: Vec<PathBuf>,
    /// Inputs staged under a numbered name, with their staged path
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

impl StagingReport {
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FileStager {
    staging_dir: PathBuf,
}

impl FileStager {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn is_eligible(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(STAGED_EXTENSION))
    }

    /// Copy every eligible input into the staging directory.
    ///
    /// Distinct documents that share a file name are staged under numbered
    /// names (`a (2).docx`) and listed in [`StagingReport::renamed`].
    pub async fn stage(&self, inputs: &[PathBuf]) -> AppResult<StagingReport> {
        tokio::fs::create_dir_all(&self.staging_dir).await?;

        let mut sources = HashSet::new();
        for input in inputs {
            if let Ok(path) = tokio::fs::canonicalize(input).await {
                sources.insert(path);
            }
        }

        let mut report = StagingReport::default();
        let mut seen = HashSet::new();
        for input in inputs {
            let file_name = match input.file_name() {
                Some(name) if Self::is_eligible(input) => name,
                _ => {
                    report.skipped.push(input.clone());
                    continue;
                }
            };

            if !tokio::fs::metadata(input)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
            {
                report.missing.push(input.clone());
                continue;
            }

            let source = tokio::fs::canonicalize(input).await?;
            if !seen.insert(source.clone()) {
                continue;
            }

            let dest = self
                .destination_for(&source, file_name, &report.staged, &sources)
                .await;
            if dest.file_name() != Some(file_name) {
                report.renamed.push((input.clone(), dest.clone()));
            }

            if !same_file(&source, &dest).await {
                tokio::fs::copy(&source, &dest).await?;
                tracing::debug!("Staged {} -> {}", input.display(), dest.display());
            }
            report.staged.push(dest);
        }

        Ok(report)
    }

    /// First free name for `file_name`: not staged earlier in this batch and
    /// not holding another requested input.
    async fn destination_for(
        &self,
        source: &Path,
        file_name: &OsStr,
        taken: &[PathBuf],
        sources: &HashSet<PathBuf>,
    ) -> PathBuf {
        let mut n = 1;
        loop {
            let candidate = if n == 1 {
                self.staging_dir.join(file_name)
            } else {
                self.staging_dir.join(numbered_name(file_name, n))
            };
            if !taken.contains(&candidate)
                && !holds_other_input(&candidate, source, sources).await
            {
                return candidate;
            }
            n += 1;
        }
    }
}

/// `a.docx` -> `a (n).docx`
fn numbered_name(file_name: &OsStr, n: usize) -> OsString {
    let path = Path::new(file_name);
    let mut name = path.file_stem().unwrap_or(file_name).to_os_string();
    name.push(format!(" ({})", n));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

async fn holds_other_input(candidate: &Path, source: &Path, sources: &HashSet<PathBuf>) -> bool {
    match tokio::fs::canonicalize(candidate).await {
        Ok(path) => path != source && sources.contains(&path),
        Err(_) => false,
    }
}

/// Copying a file onto itself would truncate it
async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
