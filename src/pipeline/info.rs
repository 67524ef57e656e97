//! Page-count query via the document-info tool.
//!
//! Never cached: each caller asks again, so a split document's count comes
//! from the split itself rather than from arithmetic on its range.

use crate::config::ProcessingConfig;
use crate::error::StageError;
use crate::runner::{Operation, ToolInvocation, ToolRunner};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

static PAGES_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*Pages:\s+(\d+)").unwrap());

/// Ask the info tool how many pages `pdf_path` has.
pub async fn page_count(
    runner: &dyn ToolRunner,
    pdf_path: &Path,
    config: &ProcessingConfig,
) -> Result<usize, StageError> {
    let invocation = ToolInvocation::new(Operation::DocumentInfo, &config.tools.document_info)
        .arg(pdf_path)
        .timeout(config.tool_timeout());

    let output = runner.run(invocation).await?;
    let pages = parse_page_count(&output.stdout).ok_or_else(|| StageError::InfoParseFailed {
        path: pdf_path.to_path_buf(),
    })?;
    debug!("{}: {} pages", pdf_path.display(), pages);
    Ok(pages)
}

/// Extract `N` from a `Pages:   N` line.
pub fn parse_page_count(info: &str) -> Option<usize> {
    PAGES_LINE
        .captures(info)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
