//! Configuration types for marker-based PDF splitting and text extraction.
//!
//! All processing behaviour is controlled through [`ProcessingConfig`], built
//! via its [`ProcessingConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across worker tasks and to log exactly what a
//! run was configured with.

use crate::error::PdfSplitError;
use crate::progress::ProgressCallback;
use crate::runner::{ProcessRunner, ToolRunner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a split-and-extract run.
///
/// Built via [`ProcessingConfig::builder()`] or using
/// [`ProcessingConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_splitter::ProcessingConfig;
///
/// let config = ProcessingConfig::builder()
///     .marker("SPLITME")
///     .ocr_dpi(300)
///     .concurrency(4)
///     .output_dir("extracted_content")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ProcessingConfig {
    /// Token whose presence on a page marks it as a split point. Default: `SPLITME`.
    ///
    /// Matched case-insensitively as a plain substring, so `splitme`,
    /// `SplitMe` and `xSPLITMEx` all flag the page.
    pub marker: String,

    /// Last page the marker scan asks the text extractor for. Default: 999.
    pub scan_page_limit: usize,

    /// Resolution used when rasterising pages for OCR. Range: 72–600. Default: 300.
    ///
    /// Tesseract is tuned for roughly 300 DPI input; lower values lose small
    /// glyphs, higher ones mostly cost time.
    pub ocr_dpi: u32,

    /// Tesseract language code. Default: `eng`.
    pub ocr_language: String,

    /// Number of source documents processed at once. Default: 2.
    ///
    /// Splits inside one document are always handled one at a time; this
    /// only bounds how many documents are in flight.
    pub concurrency: usize,

    /// Per-invocation timeout for external tools in seconds. Default: 300.
    ///
    /// `None` waits forever.
    pub tool_timeout_secs: Option<u64>,

    /// Directory receiving split documents and the results file.
    /// Default: `extracted_content`.
    pub output_dir: PathBuf,

    /// Program names for each external capability.
    pub tools: ToolPaths,

    /// Pre-constructed tool runner. Takes precedence over [`ProcessRunner`].
    pub runner: Option<Arc<dyn ToolRunner>>,

    /// Optional progress callback for per-document events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            marker: "SPLITME".to_string(),
            scan_page_limit: 999,
            ocr_dpi: 300,
            ocr_language: "eng".to_string(),
            concurrency: 2,
            tool_timeout_secs: Some(300),
            output_dir: PathBuf::from("extracted_content"),
            tools: ToolPaths::default(),
            runner: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ProcessingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingConfig")
            .field("marker", &self.marker)
            .field("scan_page_limit", &self.scan_page_limit)
            .field("ocr_dpi", &self.ocr_dpi)
            .field("ocr_language", &self.ocr_language)
            .field("concurrency", &self.concurrency)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("output_dir", &self.output_dir)
            .field("tools", &self.tools)
            .field("runner", &self.runner.as_ref().map(|_| "<dyn ToolRunner>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl ProcessingConfig {
    /// Create a new builder for `ProcessingConfig`.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder {
            config: Self::default(),
        }
    }

    /// The per-invocation timeout as a `Duration`.
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    /// The configured runner, or a fresh [`ProcessRunner`].
    pub fn resolve_runner(&self) -> Arc<dyn ToolRunner> {
        match self.runner {
            Some(ref runner) => Arc::clone(runner),
            None => Arc::new(ProcessRunner),
        }
    }
}

/// Builder for [`ProcessingConfig`].
#[derive(Debug)]
pub struct ProcessingConfigBuilder {
    config: ProcessingConfig,
}

impl ProcessingConfigBuilder {
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.config.marker = marker.into();
        self
    }

    pub fn scan_page_limit(mut self, pages: usize) -> Self {
        self.config.scan_page_limit = pages.max(1);
        self
    }

    pub fn ocr_dpi(mut self, dpi: u32) -> Self {
        self.config.ocr_dpi = dpi.clamp(72, 600);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    /// `0` disables the timeout.
    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = (secs > 0).then_some(secs);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.config.runner = Some(runner);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessingConfig, PdfSplitError> {
        let c = &self.config;
        if c.marker.trim().is_empty() {
            return Err(PdfSplitError::InvalidConfig(
                "Marker token must not be empty".into(),
            ));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(PdfSplitError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.ocr_dpi < 72 || c.ocr_dpi > 600 {
            return Err(PdfSplitError::InvalidConfig(format!(
                "OCR DPI must be 72–600, got {}",
                c.ocr_dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(PdfSplitError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Program used for each external capability.
///
/// Defaults assume poppler-utils, pdftk, tesseract and exiftool on `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    pub text_extract: String,
    pub document_info: String,
    pub page_range_extract: String,
    pub rasterize: String,
    pub ocr: String,
    pub tagger: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            text_extract: "pdftotext".to_string(),
            document_info: "pdfinfo".to_string(),
            page_range_extract: "pdftk".to_string(),
            rasterize: "pdftoppm".to_string(),
            ocr: "tesseract".to_string(),
            tagger: "exiftool".to_string(),
        }
    }
}
