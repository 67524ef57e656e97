//! Pipeline stages for splitting PDFs on marker pages.
//!
//! Each submodule implements one step and talks to external tools only
//! through [`crate::runner::ToolRunner`], so every stage can be tested with a
//! scripted runner.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ scan ──▶ info ──▶ ranges ──▶ split ──▶ extract ──▶ (ocr)
//! (*.pdf)    (markers) (pages)   (pure)    (pdftk)  (pdftotext)  (pdftoppm
//!                                                                 + tesseract)
//! ```
//!
//! 1. [`discover`] lists source PDFs in name order
//! 2. [`scan`] finds the pages carrying the split marker
//! 3. [`info`] asks for the total page count
//! 4. [`ranges`] turns markers and total into page ranges; no I/O
//! 5. [`split`] writes each range out as `<stem>_part_NNN.pdf`
//! 6. [`extract`] reads each split's text, handing image-only documents to
//!    [`ocr`]

pub mod discover;
pub mod extract;
pub mod info;
pub mod ocr;
pub mod ranges;
pub mod scan;
pub mod split;
