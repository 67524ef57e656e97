//! Error types for the pdf-splitter library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PdfSplitError`]: **Fatal**, the batch cannot proceed at all (input
//!   directory missing, output directory cannot be created, result file
//!   cannot be written). Returned as `Err(PdfSplitError)` from the top-level
//!   `process_*` functions.
//!
//! * [`StageError`]: **Non-fatal**, one operation on one document failed
//!   (a tool exited non-zero, a page could not be recognised) but everything
//!   else carries on. Stored inside [`crate::output::ProcessingResult`] so
//!   callers can inspect partial success rather than grepping logs.

use crate::runner::Operation;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-splitter library.
///
/// Per-document and per-range failures use [`StageError`] and are stored in
/// [`crate::output::ProcessingResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PdfSplitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input directory was not found at the given path.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is a directory.")]
    InputDirNotFound { path: PathBuf },

    /// The input directory exists but could not be listed.
    #[error("Failed to read input directory '{path}': {detail}")]
    InputDirUnreadable { path: PathBuf, detail: String },

    /// The input directory holds no `*.pdf` files.
    #[error("No PDF files found in '{path}'")]
    NoPdfFiles { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the directory receiving split files and results.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the aggregated JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Results could not be serialised.
    #[error("Failed to serialise results: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Collaborator inputs ───────────────────────────────────────────────
    /// A JSON input file (metadata list, results file) could not be read.
    #[error("Failed to read '{path}': {source}")]
    MetadataReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON input file was read but is not valid for its purpose.
    #[error("Invalid JSON in '{path}': {detail}")]
    InvalidJson { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A classified, non-fatal failure of one pipeline operation.
///
/// The stage that hits it returns it as `Err`; the aggregator decides how to
/// degrade (empty marker list, skipped range, empty OCR text) and keeps the
/// error on the document's result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageError {
    /// The source document disappeared between discovery and processing.
    #[error("Source document missing: '{path}'")]
    SourceMissing { path: PathBuf },

    /// The tool ran but exited unsuccessfully.
    #[error("{operation} via '{program}' failed: {detail}")]
    ToolFailed {
        operation: Operation,
        program: String,
        detail: String,
    },

    /// The tool could not be started at all (not installed, not executable).
    #[error("Could not start '{program}' for {operation}: {detail}")]
    ToolSpawnFailed {
        operation: Operation,
        program: String,
        detail: String,
    },

    /// The tool exceeded the configured per-invocation timeout and was killed.
    #[error("{operation} via '{program}' timed out after {millis}ms")]
    ToolTimedOut {
        operation: Operation,
        program: String,
        millis: u64,
    },

    /// The tool succeeded but wrote nothing to stdout.
    #[error("{operation} via '{program}' produced no output")]
    EmptyOutput { operation: Operation, program: String },

    /// The info tool's output had no parseable page count.
    #[error("Could not determine page count for '{path}'")]
    InfoParseFailed { path: PathBuf },

    /// A local filesystem operation failed.
    #[error("I/O error on '{path}': {detail}")]
    Io { path: PathBuf, detail: String },
}

impl StageError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        StageError::Io {
            path: path.into(),
            detail: err.to_string(),
        }
    }

    /// True for every variant raised by an external tool invocation.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            StageError::ToolFailed { .. }
                | StageError::ToolSpawnFailed { .. }
                | StageError::ToolTimedOut { .. }
                | StageError::EmptyOutput { .. }
        )
    }
}
