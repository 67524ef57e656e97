//! Capability runner: the one seam through which every external tool runs.
//!
//! Stages never touch `std::process` directly. They describe what they want
//! as a [`ToolInvocation`] (operation, program, arguments, working directory,
//! timeout) and hand it to a [`ToolRunner`]. Production uses
//! [`ProcessRunner`]; tests swap in a scripted fake so the scanner, splitter,
//! extractor and OCR fallback run without poppler or tesseract installed.
//!
//! A non-zero exit, a spawn failure and a timeout all come back as a
//! classified [`StageError`], so callers match on one type.

use crate::error::StageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// The capability an invocation exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Plain-text extraction with form-feed page separators.
    TextExtract,
    /// Document info query (page count).
    DocumentInfo,
    /// Materialise a page range as a new document.
    PageRangeExtract,
    /// Render pages to images.
    Rasterize,
    /// Recognise text in one image.
    Ocr,
    /// Overwrite descriptive attributes on a file.
    TagMetadata,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::TextExtract => "text extraction",
            Operation::DocumentInfo => "document info",
            Operation::PageRangeExtract => "page-range extraction",
            Operation::Rasterize => "rasterisation",
            Operation::Ocr => "OCR",
            Operation::TagMetadata => "metadata tagging",
        };
        f.write_str(name)
    }
}

/// One external tool call, fully described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub operation: Operation,
    pub program: String,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl ToolInvocation {
    pub fn new(operation: Operation, program: impl Into<String>) -> Self {
        Self {
            operation,
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments as UTF-8 (lossy), handy for logging and for test fakes.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Shell-like rendering of the command line for log messages.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args_lossy());
        parts.join(" ")
    }

    pub(crate) fn failed(&self, detail: impl Into<String>) -> StageError {
        StageError::ToolFailed {
            operation: self.operation,
            program: self.program.clone(),
            detail: detail.into(),
        }
    }

    pub(crate) fn empty_output(&self) -> StageError {
        StageError::EmptyOutput {
            operation: self.operation,
            program: self.program.clone(),
        }
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Standard output decoded lossily as UTF-8, NUL bytes removed.
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Runs external capabilities on behalf of the pipeline.
///
/// Implementations must be `Send + Sync`: documents are processed
/// concurrently and share one runner.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run one invocation to completion.
    ///
    /// Returns `Ok` only when the tool exited successfully.
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput, StageError>;

    /// Whether `program` can be started at all.
    ///
    /// The default searches `PATH` the way a shell would.
    async fn is_available(&self, program: &str) -> bool {
        find_on_path(program).is_some()
    }
}

/// Production runner backed by `tokio::process`.
///
/// Children are spawned with `kill_on_drop`, so a timed-out invocation does
/// not leave an orphan behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput, StageError> {
        debug!("exec: {}", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(ref dir) = invocation.working_dir {
            command.current_dir(dir);
        }

        let output = match invocation.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(StageError::ToolTimedOut {
                        operation: invocation.operation,
                        program: invocation.program.clone(),
                        millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    })
                }
            },
            None => command.output().await,
        }
        .map_err(|e| StageError::ToolSpawnFailed {
            operation: invocation.operation,
            program: invocation.program.clone(),
            detail: e.to_string(),
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            let detail = if stderr.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, stderr)
            };
            return Err(invocation.failed(detail));
        }

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).replace('\u{0000}', ""),
            stderr,
        })
    }
}

/// Locate an executable the way `PATH` lookup would.
///
/// A program containing a path separator is checked as-is.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_builder_collects_args() {
        let inv = ToolInvocation::new(Operation::Rasterize, "pdftoppm")
            .args(["-png", "-r"])
            .arg("300")
            .arg(Path::new("/tmp/a.pdf"))
            .timeout(Some(Duration::from_secs(5)));
        assert_eq!(inv.args_lossy(), vec!["-png", "-r", "300", "/tmp/a.pdf"]);
        assert_eq!(inv.command_line(), "pdftoppm -png -r 300 /tmp/a.pdf");
        assert_eq!(inv.timeout, Some(Duration::from_secs(5)));
        assert!(inv.working_dir.is_none());
    }

    #[test]
    fn operation_serialises_snake_case() {
        let json = serde_json::to_string(&Operation::PageRangeExtract).unwrap();
        assert_eq!(json, "\"page_range_extract\"");
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let inv = ToolInvocation::new(Operation::Ocr, "definitely-not-a-real-tool-7f3a");
        let err = tokio_test::block_on(ProcessRunner.run(inv)).unwrap_err();
        assert!(
            matches!(err, StageError::ToolSpawnFailed { operation: Operation::Ocr, .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn find_on_path_rejects_unknown() {
        assert!(find_on_path("definitely-not-a-real-tool-7f3a").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_of_successful_tool() {
        let inv = ToolInvocation::new(Operation::TextExtract, "sh")
            .arg("-c")
            .arg("printf 'page one\\fpage two'");
        let out = ProcessRunner.run(inv).await.unwrap();
        assert_eq!(out.stdout, "page one\u{000C}page two");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_tool_failure() {
        let inv = ToolInvocation::new(Operation::DocumentInfo, "sh")
            .arg("-c")
            .arg("echo broken >&2; exit 3");
        let err = ProcessRunner.run(inv).await.unwrap_err();
        match err {
            StageError::ToolFailed { detail, .. } => assert!(detail.contains("broken")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let inv = ToolInvocation::new(Operation::Ocr, "sh")
            .arg("-c")
            .arg("sleep 5")
            .timeout(Some(Duration::from_millis(100)));
        let err = ProcessRunner.run(inv).await.unwrap_err();
        assert!(
            matches!(err, StageError::ToolTimedOut { millis: 100, .. }),
            "got: {err:?}"
        );
        assert!(err.to_string().ends_with("timed out after 100ms"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn honours_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let inv = ToolInvocation::new(Operation::TextExtract, "pwd").working_dir(dir.path());
        let out = ProcessRunner.run(inv).await.unwrap();
        let reported = PathBuf::from(out.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
