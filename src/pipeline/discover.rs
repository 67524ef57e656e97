//! Source discovery: the `*.pdf` files directly inside the input directory.

use crate::error::PdfSplitError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// List the PDFs in `input_dir`, sorted by file name.
///
/// Only the top level is searched. The `.pdf` extension is matched without
/// regard to case. An empty result is an error: there is nothing to do.
pub fn discover_sources(input_dir: &Path) -> Result<Vec<PathBuf>, PdfSplitError> {
    if !input_dir.is_dir() {
        return Err(PdfSplitError::InputDirNotFound {
            path: input_dir.to_path_buf(),
        });
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| PdfSplitError::InputDirUnreadable {
            path: input_dir.to_path_buf(),
            detail: e.to_string(),
        })?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            sources.push(entry.into_path());
        }
    }

    if sources.is_empty() {
        return Err(PdfSplitError::NoPdfFiles {
            path: input_dir.to_path_buf(),
        });
    }

    debug!("Found {} PDFs in {}", sources.len(), input_dir.display());
    Ok(sources)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
