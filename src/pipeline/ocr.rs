//! OCR fallback: rasterise every page, then recognise each image.
//!
//! Images live in a [`TempDir`] owned by this call, so they are removed when
//! recognition returns, whether it succeeded or not. A rasterisation failure
//! aborts the document; a failure on one page only drops that page's text.

use crate::config::ProcessingConfig;
use crate::error::StageError;
use crate::runner::{Operation, ToolInvocation, ToolRunner};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Prefix the rasteriser writes images under; it appends `-N.png`.
const IMAGE_PREFIX: &str = "page";

/// Text recognised for one document.
#[derive(Debug, Default)]
pub struct OcrText {
    /// Non-empty page texts, trimmed, joined with a blank line.
    pub text: String,
    /// Images the rasteriser produced.
    pub pages_rendered: usize,
    /// Per-page OCR failures; those pages contribute no text.
    pub page_failures: Vec<StageError>,
}

/// Recognise the text of `pdf_path` page by page.
///
/// Returns `Err` only when no images could be produced at all.
pub async fn recognise(
    runner: &dyn ToolRunner,
    pdf_path: &Path,
    config: &ProcessingConfig,
) -> Result<OcrText, StageError> {
    let temp_dir = tempfile::Builder::new()
        .prefix("pdf_ocr")
        .tempdir()
        .map_err(|e| StageError::io(std::env::temp_dir(), &e))?;

    let images = rasterise(runner, pdf_path, &temp_dir, config).await?;
    info!(
        "OCR: {} page images for {}",
        images.len(),
        pdf_path.display()
    );

    let mut result = OcrText {
        pages_rendered: images.len(),
        ..OcrText::default()
    };
    let mut texts = Vec::with_capacity(images.len());

    for image in &images {
        let invocation = ToolInvocation::new(Operation::Ocr, &config.tools.ocr)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&config.ocr_language)
            .timeout(config.tool_timeout());

        match runner.run(invocation).await {
            Ok(output) => {
                let text = output.stdout.trim();
                if !text.is_empty() {
                    texts.push(text.to_string());
                }
            }
            Err(e) => {
                warn!("OCR failed for {}: {}", image.display(), e);
                result.page_failures.push(e);
            }
        }
    }

    result.text = texts.join("\n\n");
    debug!(
        "OCR: {} chars from {} pages of {}",
        result.text.len(),
        result.pages_rendered,
        pdf_path.display()
    );
    Ok(result)
}

/// Render every page of `pdf_path` as PNG into `temp_dir`.
///
/// Returns the images sorted by file name, which is page order: the
/// rasteriser zero-pads the page number to a fixed width.
async fn rasterise(
    runner: &dyn ToolRunner,
    pdf_path: &Path,
    temp_dir: &TempDir,
    config: &ProcessingConfig,
) -> Result<Vec<PathBuf>, StageError> {
    let invocation = ToolInvocation::new(Operation::Rasterize, &config.tools.rasterize)
        .arg("-png")
        .arg("-r")
        .arg(config.ocr_dpi.to_string())
        .arg(pdf_path)
        .arg(temp_dir.path().join(IMAGE_PREFIX))
        .timeout(config.tool_timeout());

    runner.run(invocation).await?;
    list_page_images(temp_dir.path()).await
}

/// `page-*.png` files in `dir`, sorted by name.
async fn list_page_images(dir: &Path) -> Result<Vec<PathBuf>, StageError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| StageError::io(dir, &e))?;

    let mut images = Vec::new();
    let prefix = format!("{IMAGE_PREFIX}-");
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StageError::io(dir, &e))?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(".png") {
            images.push(entry.path());
        }
    }

    images.sort();
    Ok(images)
}
