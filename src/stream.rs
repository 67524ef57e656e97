//! Streaming API: emit each document's result as soon as it is done.
//!
//! Unlike the eager [`crate::process::process_directory`], which returns only
//! after every document finishes, [`process_stream`] yields
//! [`ProcessingResult`] items through a `Stream`. Up to `concurrency`
//! documents are in flight at once, and results are still yielded in
//! discovery order: a slow document holds back the ones after it.

use crate::config::ProcessingConfig;
use crate::error::PdfSplitError;
use crate::output::ProcessingResult;
use crate::pipeline::split::unique_base_names;
use crate::process::{prepare, process_source};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document results.
pub type ResultStream = Pin<Box<dyn Stream<Item = ProcessingResult> + Send>>;

/// Split and extract every PDF in `input_dir`, streaming results.
///
/// # Returns
/// - `Ok(ResultStream)`: one item per discovered PDF, in discovery order
/// - `Err(PdfSplitError)`: fatal error (input missing, no PDFs, output
///   directory cannot be created)
///
/// # Example
/// ```rust,no_run
/// use pdf_splitter::{process_stream, ProcessingConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ProcessingConfig::default();
/// let mut results = process_stream("pdfs", &config).await?;
/// while let Some(result) = results.next().await {
///     println!("{}: {} files", result.source_pdf, result.total_files_processed);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn process_stream(
    input_dir: impl AsRef<Path>,
    config: &ProcessingConfig,
) -> Result<ResultStream, PdfSplitError> {
    let input_dir = input_dir.as_ref();
    info!("Starting streaming run over {}", input_dir.display());

    let sources = prepare(input_dir, config).await?;
    Ok(document_stream(sources, config))
}

/// Process `sources` through a bounded, order-preserving pool.
///
/// Split files of each source are named by [`unique_base_names`].
pub(crate) fn document_stream(sources: Vec<PathBuf>, config: &ProcessingConfig) -> ResultStream {
    let runner = config.resolve_runner();
    let total = sources.len();
    let concurrency = config.concurrency.max(1);
    let base_names = unique_base_names(&sources);
    let config = config.clone();

    let jobs = sources.into_iter().zip(base_names).enumerate();
    let s = stream::iter(jobs.map(move |(idx, (source, base_name))| {
        let runner = Arc::clone(&runner);
        let cfg = config.clone();
        async move {
            process_source(runner.as_ref(), &source, &base_name, idx + 1, total, &cfg).await
        }
    }))
    .buffered(concurrency);

    Box::pin(s)
}
