//! Text extraction for one split document, with OCR fallback.
//!
//! Native extraction is tried first. Its text is accepted when the tool
//! succeeded and the trimmed result is non-empty; anything else (error,
//! whitespace only, a scanned image-only document) goes through
//! [`crate::pipeline::ocr`]. Either way the page count comes from the info
//! tool, not from the number of rendered images.

use crate::config::ProcessingConfig;
use crate::error::StageError;
use crate::output::{ExtractedContent, ExtractionMethod};
use crate::pipeline::{info, ocr};
use crate::runner::{Operation, ToolInvocation, ToolRunner};
use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, warn};

/// Extracted content plus every non-fatal failure met producing it.
#[derive(Debug)]
pub struct Extraction {
    pub content: ExtractedContent,
    pub failures: Vec<StageError>,
}

/// Extract the text of `pdf_path`.
///
/// Never fails: problems are recorded in [`Extraction::failures`] and the
/// content carries whatever could be determined.
pub async fn extract(
    runner: &dyn ToolRunner,
    pdf_path: &Path,
    config: &ProcessingConfig,
) -> Extraction {
    let extracted_at = Utc::now();
    let mut failures = Vec::new();

    let file_size_bytes = match tokio::fs::metadata(pdf_path).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!("Cannot stat {}: {}", pdf_path.display(), e);
            failures.push(StageError::io(pdf_path, &e));
            0
        }
    };

    let (text, method) = match native_text(runner, pdf_path, config).await {
        Ok(text) if !text.is_empty() => (text, ExtractionMethod::Native),
        outcome => {
            if let Err(e) = outcome {
                warn!("Native extraction failed for {}: {}", pdf_path.display(), e);
                failures.push(e);
            }
            info!("Using OCR for: {}", file_name(pdf_path));
            let text = match ocr::recognise(runner, pdf_path, config).await {
                Ok(recognised) => {
                    failures.extend(recognised.page_failures);
                    recognised.text
                }
                Err(e) => {
                    warn!("OCR aborted for {}: {}", pdf_path.display(), e);
                    failures.push(e);
                    String::new()
                }
            };
            (text, ExtractionMethod::Ocr)
        }
    };

    let page_count = match info::page_count(runner, pdf_path, config).await {
        Ok(pages) => pages,
        Err(e) => {
            warn!("Page count unavailable for {}: {}", pdf_path.display(), e);
            failures.push(e);
            0
        }
    };

    debug!(
        "{}: {:?}, {} chars, {} pages",
        pdf_path.display(),
        method,
        text.len(),
        page_count
    );

    Extraction {
        content: ExtractedContent {
            file_name: file_name(pdf_path),
            extracted_at,
            text,
            page_count,
            file_size_bytes,
            method,
        },
        failures,
    }
}

/// Whole-document native text, trimmed.
async fn native_text(
    runner: &dyn ToolRunner,
    pdf_path: &Path,
    config: &ProcessingConfig,
) -> Result<String, StageError> {
    let invocation = ToolInvocation::new(Operation::TextExtract, &config.tools.text_extract)
        .arg(pdf_path)
        .arg("-")
        .timeout(config.tool_timeout());
    let output = runner.run(invocation).await?;
    Ok(output.stdout.trim().to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
