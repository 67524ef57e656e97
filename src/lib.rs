//! # pdf-splitter
//!
//! Split multi-document PDFs on marker pages and extract the text of every
//! piece.
//!
//! Scanned song books, hymnals and archive bundles often arrive as one PDF
//! holding many logical documents. An operator drops a page containing the
//! token `SPLITME` between them; this crate finds those pages, cuts the
//! document around them and pulls the text out of each piece, falling back to
//! OCR when a piece has no text layer.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Discover  *.pdf files, sorted by name
//!  ├─ 2. Scan      pages containing the marker (pdftotext, split on \f)
//!  ├─ 3. Ranges    marker pages + page total → contiguous page ranges
//!  ├─ 4. Split     one <stem>_part_NNN.pdf per range (pdftk)
//!  ├─ 5. Extract   native text, or rasterise + OCR (pdftoppm + tesseract)
//!  └─ 6. Output    one ProcessingResult per source, as a JSON array
//! ```
//!
//! Every external tool runs through the [`ToolRunner`] trait, so the whole
//! pipeline can be driven by a scripted runner in tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_splitter::{process_to_file, ProcessingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProcessingConfig::default();
//!     let summary = process_to_file("pdfs", &config).await?;
//!     eprintln!(
//!         "{} documents → {} split files ({} via OCR)",
//!         summary.documents, summary.split_files, summary.ocr_files
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfsplit` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-splitter = { version = "0.1", default-features = false }
//! ```
//!
//! ## External Tools
//!
//! | Capability | Default program |
//! |------------|-----------------|
//! | Text extraction | `pdftotext` (poppler) |
//! | Page count | `pdfinfo` (poppler) |
//! | Page-range extraction | `pdftk` |
//! | Rasterisation | `pdftoppm` (poppler) |
//! | OCR | `tesseract` |
//! | Metadata tagging | `exiftool` |
//!
//! Program names are configurable through [`ToolPaths`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod runner;
pub mod stream;
pub mod tagging;
pub mod truncate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ProcessingConfig, ProcessingConfigBuilder, ToolPaths};
pub use error::{PdfSplitError, StageError};
pub use output::{BatchOutput, BatchSummary, ExtractedContent, ExtractionMethod, ProcessingResult};
pub use pipeline::ranges::{build_ranges, PageRange};
pub use process::{
    process_directory, process_document, process_sync, process_to_file, results_path,
    write_results,
};
pub use progress::{NoopProgressCallback, ProcessingProgressCallback, ProgressCallback};
pub use runner::{Operation, ProcessRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use stream::{process_stream, ResultStream};
pub use tagging::{read_metadata, tag_files, MetadataRecord, TaggingReport};
pub use truncate::{truncate_file, truncate_strings};
