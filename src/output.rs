//! Result records produced by the pipeline.
//!
//! [`ProcessingResult`] is the per-source-document record; a run's JSON file
//! is a pretty-printed array of them. [`BatchSummary`] carries the counts the
//! CLI prints at the end of a run.

use crate::error::StageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the text of a split document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Embedded text layer, read directly.
    #[default]
    Native,
    /// Rasterise-then-recognise fallback.
    Ocr,
}

/// Extracted text and facts about one split document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// File name (no directory) of the split document.
    pub file_name: String,
    /// Moment extraction of this document began.
    pub extracted_at: DateTime<Utc>,
    /// Trimmed native text, or the joined OCR output. May be empty.
    pub text: String,
    /// Page count as reported by the info tool; 0 only if that query failed.
    pub page_count: usize,
    pub file_size_bytes: u64,
    /// Not part of the JSON record.
    #[serde(skip)]
    pub method: ExtractionMethod,
}

/// Everything produced for one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// File name (no directory) of the source document.
    pub source_pdf: String,
    /// One entry per successfully materialised split, in range order.
    pub split_files: Vec<ExtractedContent>,
    #[serde(rename = "processing_time_seconds", with = "duration_secs")]
    pub processing_time: Duration,
    pub total_files_processed: usize,
    /// Non-fatal failures met while processing this document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StageError>,
}

impl ProcessingResult {
    /// An empty result, as created when processing of a source begins.
    pub fn new(source_pdf: impl Into<String>) -> Self {
        Self {
            source_pdf: source_pdf.into(),
            split_files: Vec::new(),
            processing_time: Duration::ZERO,
            total_files_processed: 0,
            failures: Vec::new(),
        }
    }

    pub fn push(&mut self, content: ExtractedContent) {
        self.split_files.push(content);
    }

    /// Seal the record with its elapsed time and final count.
    pub fn finish(&mut self, elapsed: Duration) {
        self.processing_time = elapsed;
        self.total_files_processed = self.split_files.len();
    }

    /// Splits whose text came from the OCR fallback.
    pub fn ocr_count(&self) -> usize {
        self.split_files
            .iter()
            .filter(|c| c.method == ExtractionMethod::Ocr)
            .count()
    }
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Source documents processed.
    pub documents: usize,
    /// Split documents extracted, across all sources.
    pub split_files: usize,
    /// Split documents whose text came from OCR.
    pub ocr_files: usize,
    /// Non-fatal failures recorded, across all sources.
    pub failed_operations: usize,
    /// Source documents with at least one recorded failure.
    pub documents_with_failures: usize,
    #[serde(rename = "duration_seconds", with = "duration_secs")]
    pub duration: Duration,
}

impl BatchSummary {
    pub fn from_results(results: &[ProcessingResult], duration: Duration) -> Self {
        Self {
            documents: results.len(),
            split_files: results.iter().map(|r| r.split_files.len()).sum(),
            ocr_files: results.iter().map(ProcessingResult::ocr_count).sum(),
            failed_operations: results.iter().map(|r| r.failures.len()).sum(),
            documents_with_failures: results.iter().filter(|r| !r.failures.is_empty()).count(),
            duration,
        }
    }
}

/// Results for a whole input directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutput {
    /// One record per source document, in discovery order.
    pub results: Vec<ProcessingResult>,
    pub summary: BatchSummary,
}

/// `Duration` as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
