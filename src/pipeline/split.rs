//! Document splitting: write each page range out as its own PDF.
//!
//! Output names are `<stem>_part_<NNN>.pdf`, where `NNN` is the range's
//! 1-based position in the range list. A range that fails to materialise is
//! skipped and recorded; later ranges keep their own sequence numbers, so a
//! failure shows up as a gap in the numbering rather than a shift.

use crate::config::ProcessingConfig;
use crate::error::StageError;
use crate::pipeline::ranges::PageRange;
use crate::runner::{Operation, ToolInvocation, ToolRunner};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One materialised split document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFile {
    /// 1-based position of `range` in the range list.
    pub sequence: usize,
    pub range: PageRange,
    pub path: PathBuf,
}

/// What came out of splitting one source document.
#[derive(Debug, Default)]
pub struct SplitOutcome {
    /// Produced files, in range order.
    pub files: Vec<SplitFile>,
    /// One entry per range that could not be written.
    pub failures: Vec<StageError>,
}

/// Base name used for split outputs: the source file stem.
pub fn source_base_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Base names for a whole batch, one per source, never repeated.
///
/// A stem shared by several sources (`a.pdf` and `a.PDF`) keeps its
/// extension in the base name (`a_pdf`, `a_PDF`), so their split files
/// cannot overwrite each other. Any name still taken gets a numeric suffix.
pub fn unique_base_names(sources: &[PathBuf]) -> Vec<String> {
    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for source in sources {
        *stem_counts.entry(source_base_name(source)).or_default() += 1;
    }

    let mut taken = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let stem = source_base_name(source);
            let candidate = match source.extension() {
                Some(ext) if stem_counts[&stem] > 1 => {
                    format!("{}_{}", stem, ext.to_string_lossy())
                }
                _ => stem,
            };
            let mut name = candidate.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{}_{}", candidate, n);
                n += 1;
            }
            name
        })
        .collect()
}

/// Deterministic output file name for the `sequence`-th range.
pub fn split_file_name(base_name: &str, sequence: usize) -> String {
    format!("{}_part_{:03}.pdf", base_name, sequence)
}

/// Materialise every range of `source` into `output_dir`, naming the files
/// after `base_name`.
pub async fn split_document(
    runner: &dyn ToolRunner,
    source: &Path,
    base_name: &str,
    ranges: &[PageRange],
    output_dir: &Path,
    config: &ProcessingConfig,
) -> SplitOutcome {
    let mut outcome = SplitOutcome::default();

    for (idx, range) in ranges.iter().enumerate() {
        let sequence = idx + 1;
        let path = output_dir.join(split_file_name(base_name, sequence));

        let invocation =
            ToolInvocation::new(Operation::PageRangeExtract, &config.tools.page_range_extract)
                .arg(source)
                .arg("cat")
                .arg(range.to_string())
                .arg("output")
                .arg(&path)
                .timeout(config.tool_timeout());

        match runner.run(invocation).await {
            Ok(_) => {
                debug!("{} pages {} → {}", source.display(), range, path.display());
                outcome.files.push(SplitFile {
                    sequence,
                    range: *range,
                    path,
                });
            }
            Err(e) => {
                warn!(
                    "Failed to split {} range {}: {}",
                    source.display(),
                    range,
                    e
                );
                outcome.failures.push(e);
            }
        }
    }

    outcome
}
