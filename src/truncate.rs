//! Preview helper: shorten every string in a JSON document.
//!
//! A results file holds the full text of every split and quickly grows too
//! large to skim. [`truncate_file`] writes a sibling copy where each string
//! leaf is cut to at most `max_chars` characters. Numbers, booleans, nulls,
//! keys, key order and array lengths are left alone, so the copy has exactly
//! the shape of the original.

use crate::error::PdfSplitError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default string budget for previews.
pub const DEFAULT_MAX_CHARS: usize = 250;

/// Return a copy of `value` with every string cut to `max_chars` characters.
///
/// Characters are Unicode scalar values, so a cut never splits a code point.
/// Applying it twice gives the same result as applying it once.
pub fn truncate_strings(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) => Value::String(truncate_str(s, max_chars).to_string()),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| truncate_strings(item, max_chars))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_strings(v, max_chars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// `<dir>/<stem>_short.json` for `path`.
pub fn short_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!("{stem}_short.json"))
}

/// Read `input`, truncate its strings and write pretty-printed JSON to
/// `output`.
pub async fn truncate_file(
    input: &Path,
    output: &Path,
    max_chars: usize,
) -> Result<(), PdfSplitError> {
    let data = tokio::fs::read(input)
        .await
        .map_err(|e| PdfSplitError::MetadataReadFailed {
            path: input.to_path_buf(),
            source: e,
        })?;
    let value: Value = serde_json::from_slice(&data).map_err(|e| PdfSplitError::InvalidJson {
        path: input.to_path_buf(),
        detail: e.to_string(),
    })?;

    let short = truncate_strings(&value, max_chars);
    let json = serde_json::to_string_pretty(&short)?;
    tokio::fs::write(output, json)
        .await
        .map_err(|e| PdfSplitError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: e,
        })?;

    info!(
        "Wrote {} with strings cut to {} characters",
        output.display(),
        max_chars
    );
    Ok(())
}
