//! Batch entry points: split and extract every PDF in a directory.
//!
//! [`process_directory`] waits for all documents and returns them together
//! with a [`BatchSummary`]; [`crate::stream::process_stream`] yields each
//! [`ProcessingResult`] as soon as its document is done. Both share the
//! per-document routine in this module.
//!
//! Only failures that stop the batch as a whole surface as
//! `Err(PdfSplitError)`. Everything that goes wrong inside one document is
//! logged, recorded on that document's result and skipped over.

use crate::config::ProcessingConfig;
use crate::error::{PdfSplitError, StageError};
use crate::output::{BatchOutput, BatchSummary, ExtractionMethod, ProcessingResult};
use crate::pipeline::{discover, extract, info, ranges, scan, split};
use crate::runner::ToolRunner;
use crate::stream::document_stream;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// File name of the aggregated results inside the output directory.
pub const RESULTS_FILE_NAME: &str = "extracted_content.json";

/// Split and extract every PDF in `input_dir`.
///
/// Split documents are written to `config.output_dir`, which is created if
/// needed. Results come back in discovery order regardless of
/// `config.concurrency`.
///
/// # Errors
/// Returns `Err(PdfSplitError)` only for fatal errors:
/// - Input directory missing, unreadable or holding no PDFs
/// - Output directory cannot be created
pub async fn process_directory(
    input_dir: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<BatchOutput, PdfSplitError> {
    let batch_start = Instant::now();
    let input_dir = input_dir.as_ref();
    info!("Processing PDFs in {}", input_dir.display());

    let sources = prepare(input_dir, config).await?;
    let total = sources.len();
    info!("Found {} PDF files to process", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let results: Vec<ProcessingResult> = document_stream(sources, config).collect().await;
    let summary = BatchSummary::from_results(&results, batch_start.elapsed());

    info!(
        "Batch complete: {} documents, {} split files ({} via OCR), {} failures in {:.2}s",
        summary.documents,
        summary.split_files,
        summary.ocr_files,
        summary.failed_operations,
        summary.duration.as_secs_f64()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(summary.documents, summary.split_files);
    }

    Ok(BatchOutput { results, summary })
}

/// Process `input_dir` and write the results array to
/// `<output_dir>/extracted_content.json`.
///
/// Uses atomic write (temp file + rename) so a crashed run never leaves a
/// truncated results file behind.
pub async fn process_to_file(
    input_dir: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<BatchSummary, PdfSplitError> {
    let output = process_directory(input_dir, config).await?;
    let path = results_path(config);
    write_results(&output.results, &path).await?;
    info!("Results saved to {}", path.display());
    Ok(output.summary)
}

/// Where [`process_to_file`] writes for `config`.
pub fn results_path(config: &ProcessingConfig) -> PathBuf {
    config.output_dir.join(RESULTS_FILE_NAME)
}

/// Write `results` as a pretty-printed JSON array to `path`, atomically.
pub async fn write_results(
    results: &[ProcessingResult],
    path: &Path,
) -> Result<(), PdfSplitError> {
    let json = serde_json::to_string_pretty(results)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PdfSplitError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| PdfSplitError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| PdfSplitError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(())
}

/// Synchronous wrapper around [`process_directory`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    input_dir: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<BatchOutput, PdfSplitError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfSplitError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_directory(input_dir, config))
}

/// Split and extract a single source document.
///
/// Split files are named after the source's file stem. Problems inside the
/// document are recorded on [`ProcessingResult::failures`].
///
/// # Errors
/// Returns `Err(PdfSplitError::OutputDirCreateFailed)` when
/// `config.output_dir` cannot be created.
pub async fn process_document(
    source: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<ProcessingResult, PdfSplitError> {
    let source = source.as_ref();
    create_output_dir(config).await?;
    let runner = config.resolve_runner();
    let base_name = split::source_base_name(source);
    Ok(process_source(runner.as_ref(), source, &base_name, 1, 1, config).await)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Create the output directory and discover sources.
pub(crate) async fn prepare(
    input_dir: &Path,
    config: &ProcessingConfig,
) -> Result<Vec<PathBuf>, PdfSplitError> {
    create_output_dir(config).await?;
    discover::discover_sources(input_dir)
}

async fn create_output_dir(config: &ProcessingConfig) -> Result<(), PdfSplitError> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| PdfSplitError::OutputDirCreateFailed {
            path: config.output_dir.clone(),
            source: e,
        })
}

/// The per-document routine behind every entry point.
///
/// `base_name` names the split files and must be unique within the batch.
/// `index` is the 1-based discovery position, for progress reporting only.
pub(crate) async fn process_source(
    runner: &dyn ToolRunner,
    source: &Path,
    base_name: &str,
    index: usize,
    total: usize,
    config: &ProcessingConfig,
) -> ProcessingResult {
    let start = Instant::now();
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    let mut result = ProcessingResult::new(name.clone());
    let cb = config.progress_callback.as_ref();

    info!("Processing PDF: {}", name);
    if let Some(cb) = cb {
        cb.on_document_start(&name, index, total);
    }

    let record = |result: &mut ProcessingResult, err: StageError| {
        if let Some(cb) = cb {
            cb.on_stage_error(&name, &err.to_string());
        }
        result.failures.push(err);
    };

    if !tokio::fs::try_exists(source).await.unwrap_or(false) {
        warn!("Source PDF not found: {}", source.display());
        record(
            &mut result,
            StageError::SourceMissing {
                path: source.to_path_buf(),
            },
        );
        return finish(result, start, config);
    }

    let markers = match scan::find_marker_pages(runner, source, config).await {
        Ok(markers) => markers,
        Err(e) => {
            warn!("Marker scan failed for {}: {}", name, e);
            record(&mut result, e);
            Vec::new()
        }
    };
    info!("Found {} split markers in {}", markers.len(), name);

    let total_pages = match info::page_count(runner, source, config).await {
        Ok(pages) => pages,
        Err(e) => {
            warn!("Page count failed for {}: {}", name, e);
            record(&mut result, e);
            0
        }
    };

    let page_ranges = ranges::build_ranges(&markers, total_pages);
    debug!("{}: {} pages → ranges {:?}", name, total_pages, page_ranges);

    let outcome = split::split_document(
        runner,
        source,
        base_name,
        &page_ranges,
        &config.output_dir,
        config,
    )
    .await;
    for err in outcome.failures {
        record(&mut result, err);
    }

    for file in &outcome.files {
        let extraction = extract::extract(runner, &file.path, config).await;
        for err in extraction.failures {
            record(&mut result, err);
        }
        let content = extraction.content;
        if let Some(cb) = cb {
            cb.on_split_complete(
                &name,
                &content.file_name,
                content.text.len(),
                content.method == ExtractionMethod::Ocr,
            );
        }
        result.push(content);
    }

    finish(result, start, config)
}

fn finish(
    mut result: ProcessingResult,
    start: Instant,
    config: &ProcessingConfig,
) -> ProcessingResult {
    result.finish(start.elapsed());
    info!(
        "Completed {}: {} files in {:.2}s",
        result.source_pdf,
        result.total_files_processed,
        result.processing_time.as_secs_f64()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(
            &result.source_pdf,
            result.total_files_processed,
            result.failures.len(),
            result.processing_time,
        );
    }
    result
}
