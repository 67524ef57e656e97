//! Marker scanning: find the pages that carry the split token.
//!
//! The text extractor emits a form feed between pages, so splitting its
//! stdout on `\f` gives one block per page in page order. Matching is a plain
//! case-insensitive substring test; a page mentioning `SPLITMEnt` in running
//! text is flagged too. That false positive is a known limitation.

use crate::config::ProcessingConfig;
use crate::error::StageError;
use crate::runner::{Operation, ToolInvocation, ToolRunner};
use std::path::Path;
use tracing::debug;

/// Page separator emitted by the text extractor.
pub const PAGE_SEPARATOR: char = '\u{000C}';

/// Return the ascending 1-based pages of `pdf_path` that contain the marker.
///
/// An invocation failure, or a run that prints nothing at all, is an error;
/// the caller treats the document as having no split points.
pub async fn find_marker_pages(
    runner: &dyn ToolRunner,
    pdf_path: &Path,
    config: &ProcessingConfig,
) -> Result<Vec<usize>, StageError> {
    let invocation = ToolInvocation::new(Operation::TextExtract, &config.tools.text_extract)
        .args(["-f", "1", "-l"])
        .arg(config.scan_page_limit.to_string())
        .arg(pdf_path)
        .arg("-")
        .timeout(config.tool_timeout());

    let output = runner.run(invocation.clone()).await?;
    if output.stdout.is_empty() {
        return Err(invocation.empty_output());
    }

    let pages = marker_pages(&output.stdout, &config.marker);
    debug!(
        "{}: marker '{}' on pages {:?}",
        pdf_path.display(),
        config.marker,
        pages
    );
    Ok(pages)
}

/// Split page-separated text and report the 1-based pages containing `marker`.
pub fn marker_pages(text: &str, marker: &str) -> Vec<usize> {
    let needle = marker.to_lowercase();
    text.split(PAGE_SEPARATOR)
        .enumerate()
        .filter(|(_, page)| page.to_lowercase().contains(&needle))
        .map(|(idx, _)| idx + 1)
        .collect()
}
