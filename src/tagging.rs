//! Metadata tagging: copy split files under new names and embed descriptive
//! attributes.
//!
//! Input is a hand-curated JSON list (one [`MetadataRecord`] per split file).
//! Each record's file is copied from the source directory to the output
//! directory as `new_filename`; when the tagging tool is installed the copy
//! then gets its Title, Author, Subject and Keywords overwritten. Without the
//! tool the copies are still made, just untagged.

use crate::config::ProcessingConfig;
use crate::error::{PdfSplitError, StageError};
use crate::runner::{Operation, ToolInvocation, ToolRunner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default location of the metadata list.
pub const DEFAULT_METADATA_PATH: &str = "extracted_content/metadata_clean.json";
/// Default directory the tagged copies are written to.
pub const DEFAULT_TAGGED_DIR: &str = "processed_files_with_metadata";

/// Descriptive attributes for one split file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecord {
    /// Name of the file inside the source directory.
    pub file_name: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "Tags")]
    pub tags: Vec<String>,
    #[serde(rename = "Composer")]
    pub composer: String,
    /// Name of the copy inside the output directory.
    pub new_filename: String,
}

impl MetadataRecord {
    /// Output name, falling back to the source name when none was given.
    pub fn target_name(&self) -> &str {
        if self.new_filename.is_empty() {
            &self.file_name
        } else {
            &self.new_filename
        }
    }
}

/// Outcome of a tagging run.
#[derive(Debug, Default)]
pub struct TaggingReport {
    /// Records copied (and tagged, if the tool was available).
    pub processed: usize,
    /// Failed records, keyed by their source file name.
    pub failures: Vec<(String, StageError)>,
    /// Whether the tagging tool was found.
    pub tagger_available: bool,
}

/// Read and parse the metadata list at `path`.
pub async fn read_metadata(path: &Path) -> Result<Vec<MetadataRecord>, PdfSplitError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| PdfSplitError::MetadataReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    serde_json::from_slice(&data).map_err(|e| PdfSplitError::InvalidJson {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Copy and tag every record's file.
///
/// A failure on one record never stops the others. Only an output directory
/// that cannot be created is fatal.
pub async fn tag_files(
    records: &[MetadataRecord],
    source_dir: &Path,
    output_dir: &Path,
    config: &ProcessingConfig,
) -> Result<TaggingReport, PdfSplitError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| PdfSplitError::OutputDirCreateFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

    let runner = config.resolve_runner();
    let tagger_available = runner.is_available(&config.tools.tagger).await;
    if !tagger_available {
        warn!(
            "'{}' not found; files will be copied without embedded metadata",
            config.tools.tagger
        );
    }

    let mut report = TaggingReport {
        tagger_available,
        ..TaggingReport::default()
    };

    for record in records {
        let outcome = tag_one(
            runner.as_ref(),
            record,
            source_dir,
            output_dir,
            tagger_available,
            config,
        )
        .await;
        match outcome {
            Ok(target) => {
                info!("Processed with metadata: {} -> {}", record.file_name, target.display());
                report.processed += 1;
            }
            Err(e) => {
                warn!("Error processing {}: {}", record.file_name, e);
                report.failures.push((record.file_name.clone(), e));
            }
        }
    }

    Ok(report)
}

async fn tag_one(
    runner: &dyn ToolRunner,
    record: &MetadataRecord,
    source_dir: &Path,
    output_dir: &Path,
    tag: bool,
    config: &ProcessingConfig,
) -> Result<PathBuf, StageError> {
    let source = source_dir.join(&record.file_name);
    if record.file_name.is_empty() || !tokio::fs::try_exists(&source).await.unwrap_or(false) {
        return Err(StageError::SourceMissing { path: source });
    }

    let target = output_dir.join(record.target_name());
    tokio::fs::copy(&source, &target)
        .await
        .map_err(|e| StageError::io(&target, &e))?;

    if tag {
        runner.run(tag_invocation(record, &target, config)).await?;
    }
    Ok(target)
}

/// The tagging tool call that overwrites `target`'s attributes in place.
pub fn tag_invocation(
    record: &MetadataRecord,
    target: &Path,
    config: &ProcessingConfig,
) -> ToolInvocation {
    ToolInvocation::new(Operation::TagMetadata, &config.tools.tagger)
        .arg("-overwrite_original")
        .arg(format!("-Title={}", record.title))
        .arg(format!("-Author={}", record.composer))
        .arg(format!("-Subject={}", record.genre))
        .arg(format!("-Keywords={}", record.tags.join(", ")))
        .arg(target)
        .timeout(config.tool_timeout())
}
