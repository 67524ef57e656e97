//! Progress-callback trait for per-document processing events.
//!
//! Inject an [`Arc<dyn ProcessingProgressCallback>`] via
//! [`crate::config::ProcessingConfigBuilder::progress_callback`] to receive
//! events as the batch moves through each source document and each split.
//!
//! # Example
//!
//! ```rust
//! use pdf_splitter::{ProcessingProgressCallback, ProcessingConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     splits: Arc<AtomicUsize>,
//! }
//!
//! impl ProcessingProgressCallback for CountingCallback {
//!     fn on_split_complete(&self, document: &str, file_name: &str, text_len: usize, used_ocr: bool) {
//!         self.splits.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{document}: {file_name} ({text_len} chars, ocr={used_ocr})");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     splits: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ProcessingConfig::builder()
//!     .progress_callback(counter as Arc<dyn ProcessingProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;
use std::time::Duration;

/// Called by the pipeline as it processes each source document.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` several
/// documents are in flight and their events interleave. All methods have
/// no-op defaults so callers only override what they care about.
pub trait ProcessingProgressCallback: Send + Sync {
    /// Called once after discovery, before any document is processed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when work on a source document begins.
    ///
    /// `index` is the 1-based position in discovery order.
    fn on_document_start(&self, document: &str, index: usize, total_documents: usize) {
        let _ = (document, index, total_documents);
    }

    /// Called after one split document has been extracted.
    fn on_split_complete(&self, document: &str, file_name: &str, text_len: usize, used_ocr: bool) {
        let _ = (document, file_name, text_len, used_ocr);
    }

    /// Called when a non-fatal failure is recorded for a document.
    fn on_stage_error(&self, document: &str, error: &str) {
        let _ = (document, error);
    }

    /// Called when a source document is finished.
    fn on_document_complete(
        &self,
        document: &str,
        split_files: usize,
        failures: usize,
        elapsed: Duration,
    ) {
        let _ = (document, split_files, failures, elapsed);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, total_split_files: usize) {
        let _ = (total_documents, total_split_files);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessingProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ProcessingConfig`].
pub type ProgressCallback = Arc<dyn ProcessingProgressCallback>;
