//! CLI binary for pdf-splitter.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessingConfig` and prints results. Three subcommands: `split` runs
//! the pipeline, `truncate` writes a preview of a results file and `tag`
//! copies split files under curated names with embedded metadata.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_splitter::tagging::{DEFAULT_METADATA_PATH, DEFAULT_TAGGED_DIR};
use pdf_splitter::truncate::{short_path, DEFAULT_MAX_CHARS};
use pdf_splitter::{
    process_to_file, read_metadata, results_path, tag_files, truncate_file, ProcessingConfig,
    ProcessingProgressCallback, ProgressCallback, ToolPaths,
};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over source documents plus a log line
/// per extracted split. Documents may finish out of order when
/// `--concurrency` is above 1, so start times are keyed by name.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` reports how many documents there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning input directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} PDFs  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Splitting");
        self.bar.reset_eta();
    }
}

impl ProcessingProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} PDF files…"))
        ));
    }

    fn on_document_start(&self, document: &str, _index: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(document.to_string(), Instant::now());
        }
        self.bar.set_message(document.to_string());
    }

    fn on_split_complete(&self, _document: &str, file_name: &str, text_len: usize, used_ocr: bool) {
        self.bar.println(format!(
            "    {} {:<40} {}  {}",
            dim("·"),
            file_name,
            dim(&format!("{text_len:>6} chars")),
            if used_ocr { yellow("OCR") } else { dim("text") },
        ));
    }

    fn on_stage_error(&self, document: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 100 {
            format!("{}\u{2026}", error.chars().take(99).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), document, red(&msg)));
    }

    fn on_document_complete(
        &self,
        document: &str,
        split_files: usize,
        failures: usize,
        elapsed: Duration,
    ) {
        if let Ok(mut times) = self.start_times.lock() {
            times.remove(document);
        }
        self.bar.println(format!(
            "  {} {:<40} {:>3} files  {}",
            if failures == 0 { green("✓") } else { yellow("⚠") },
            document,
            split_files,
            dim(&format!("{:.1}s", elapsed.as_secs_f64())),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, total_split_files: usize) {
        self.bar.finish_and_clear();
        let errors = self.errors.load(Ordering::SeqCst);
        if errors == 0 {
            eprintln!(
                "{} {} PDFs split into {} files",
                green("✔"),
                bold(&total_documents.to_string()),
                bold(&total_split_files.to_string())
            );
        } else {
            eprintln!(
                "{} {} PDFs split into {} files  ({} failed operations)",
                yellow("⚠"),
                bold(&total_documents.to_string()),
                bold(&total_split_files.to_string()),
                red(&errors.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split every PDF in ./pdfs on SPLITME pages, extract text
  pdfsplit split pdfs

  # Custom marker and output directory, four PDFs at a time
  pdfsplit split --marker NEXTSONG --concurrency 4 -o out pdfs

  # German OCR for scanned sources
  pdfsplit split --ocr-lang deu pdfs

  # Preview the results with strings cut to 250 characters
  pdfsplit truncate extracted_content/extracted_content.json

  # Copy split files under curated names and embed metadata
  pdfsplit tag --metadata extracted_content/metadata_clean.json

EXTERNAL TOOLS:
  pdftotext, pdfinfo, pdftoppm   poppler-utils
  pdftk                          pdftk / pdftk-java
  tesseract                      tesseract-ocr (+ language packs)
  exiftool                       optional; used by `tag` only

ENVIRONMENT VARIABLES:
  RUST_LOG                 Overrides the log filter (e.g. pdf_splitter=debug)
  PDFSPLIT_OUTPUT_DIR      Output directory for split files and results
  PDFSPLIT_MARKER          Split marker token
  PDFSPLIT_CONCURRENCY     PDFs processed at once
  PDFSPLIT_OCR_DPI         Rasterisation DPI for OCR
  PDFSPLIT_OCR_LANG        Tesseract language
  PDFSPLIT_TOOL_TIMEOUT    Per-tool timeout in seconds (0 = none)
"#;

/// Split multi-document PDFs on marker pages and extract their text.
#[derive(Parser, Debug)]
#[command(
    name = "pdfsplit",
    version,
    about = "Split multi-document PDFs on marker pages and extract their text",
    long_about = "Find pages carrying a split marker (default SPLITME), cut each PDF into \
one file per run of pages between markers, and extract the text of every piece. Pieces \
without a text layer are rasterised and OCR'd with tesseract.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFSPLIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFSPLIT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split every PDF in a directory and extract text from the pieces.
    Split(SplitArgs),
    /// Write a copy of a JSON file with every string shortened.
    Truncate(TruncateArgs),
    /// Copy split files under new names and embed descriptive metadata.
    Tag(TagArgs),
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Directory containing the source PDFs.
    input_dir: PathBuf,

    /// Directory receiving split files and extracted_content.json.
    #[arg(short, long, env = "PDFSPLIT_OUTPUT_DIR", default_value = "extracted_content")]
    output_dir: PathBuf,

    /// Token marking a page as a split point (case-insensitive).
    #[arg(long, env = "PDFSPLIT_MARKER", default_value = "SPLITME")]
    marker: String,

    /// Number of PDFs processed concurrently.
    #[arg(short, long, env = "PDFSPLIT_CONCURRENCY", default_value_t = 2)]
    concurrency: usize,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, env = "PDFSPLIT_OCR_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    ocr_dpi: u32,

    /// Tesseract language code(s), e.g. eng or eng+deu.
    #[arg(long, env = "PDFSPLIT_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Last page the marker scan reads.
    #[arg(long, env = "PDFSPLIT_SCAN_PAGE_LIMIT", default_value_t = 999)]
    scan_page_limit: usize,

    /// Per-tool timeout in seconds; 0 disables it.
    #[arg(long, env = "PDFSPLIT_TOOL_TIMEOUT", default_value_t = 300)]
    tool_timeout: u64,

    /// Print the batch summary as JSON on stdout.
    #[arg(long, env = "PDFSPLIT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSPLIT_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    tools: ToolArgs,
}

/// Program overrides for each external capability.
#[derive(Args, Debug)]
struct ToolArgs {
    #[arg(long, env = "PDFSPLIT_PDFTOTEXT", default_value = "pdftotext")]
    pdftotext: String,
    #[arg(long, env = "PDFSPLIT_PDFINFO", default_value = "pdfinfo")]
    pdfinfo: String,
    #[arg(long, env = "PDFSPLIT_PDFTK", default_value = "pdftk")]
    pdftk: String,
    #[arg(long, env = "PDFSPLIT_PDFTOPPM", default_value = "pdftoppm")]
    pdftoppm: String,
    #[arg(long, env = "PDFSPLIT_TESSERACT", default_value = "tesseract")]
    tesseract: String,
}

#[derive(Args, Debug)]
struct TruncateArgs {
    /// JSON file to shorten.
    #[arg(default_value = "extracted_content/extracted_content.json")]
    input: PathBuf,

    /// Output path. Default: `<stem>_short.json` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum characters kept per string.
    #[arg(long, env = "PDFSPLIT_MAX_CHARS", default_value_t = DEFAULT_MAX_CHARS)]
    max_chars: usize,
}

#[derive(Args, Debug)]
struct TagArgs {
    /// Metadata list: [{file_name, Title, Genre, Tags, Composer, new_filename}].
    #[arg(long, env = "PDFSPLIT_METADATA", default_value = DEFAULT_METADATA_PATH)]
    metadata: PathBuf,

    /// Directory holding the files named by `file_name`.
    #[arg(long, env = "PDFSPLIT_SOURCE_DIR", default_value = "extracted_content")]
    source_dir: PathBuf,

    /// Directory receiving the renamed, tagged copies.
    #[arg(long, env = "PDFSPLIT_TAGGED_DIR", default_value = DEFAULT_TAGGED_DIR)]
    output_dir: PathBuf,

    /// Tagging program.
    #[arg(long, env = "PDFSPLIT_EXIFTOOL", default_value = "exiftool")]
    exiftool: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are suppressed while the progress bar is
    // active; the bar prints the per-document lines instead.
    let show_progress = match cli.command {
        Command::Split(ref args) => !cli.quiet && !args.no_progress && !args.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Split(ref args) => run_split(args, cli.quiet, show_progress).await,
        Command::Truncate(ref args) => run_truncate(args, cli.quiet).await,
        Command::Tag(ref args) => run_tag(args, cli.quiet).await,
    }
}

async fn run_split(args: &SplitArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ProcessingProgressCallback>)
    } else {
        None
    };

    let config = build_config(args, progress_cb)?;
    let summary = process_to_file(&args.input_dir, &config)
        .await
        .context("Processing failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    }

    if !quiet {
        let ok_documents = summary.documents - summary.documents_with_failures;
        eprintln!(
            "{}  {}/{} PDFs clean  {} split files ({} via OCR)  {:.1}s  →  {}",
            if summary.failed_operations == 0 {
                green("✔")
            } else {
                yellow("⚠")
            },
            ok_documents,
            summary.documents,
            summary.split_files,
            summary.ocr_files,
            summary.duration.as_secs_f64(),
            bold(&results_path(&config).display().to_string()),
        );
        if summary.failed_operations > 0 {
            eprintln!(
                "   {} failed operations in {} PDFs; see \"failures\" in the results file",
                red(&summary.failed_operations.to_string()),
                summary.documents_with_failures,
            );
        }
    }

    Ok(())
}

async fn run_truncate(args: &TruncateArgs, quiet: bool) -> Result<()> {
    let output = args.output.clone().unwrap_or_else(|| short_path(&args.input));
    truncate_file(&args.input, &output, args.max_chars)
        .await
        .with_context(|| format!("Failed to truncate {}", args.input.display()))?;

    if !quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&output.display().to_string()),
            dim(&format!("(strings ≤ {} chars)", args.max_chars)),
        );
    }
    Ok(())
}

async fn run_tag(args: &TagArgs, quiet: bool) -> Result<()> {
    let records = read_metadata(&args.metadata)
        .await
        .context("Failed to load metadata list")?;

    let tools = ToolPaths {
        tagger: args.exiftool.clone(),
        ..ToolPaths::default()
    };
    let config = ProcessingConfig::builder()
        .tools(tools)
        .build()
        .context("Invalid configuration")?;

    let report = tag_files(&records, &args.source_dir, &args.output_dir, &config)
        .await
        .context("Tagging failed")?;

    if !quiet {
        for (file, err) in &report.failures {
            eprintln!("  {} {}  {}", red("✗"), file, red(&err.to_string()));
        }
        eprintln!(
            "{}  {} files processed  {} errors  →  {}",
            if report.failures.is_empty() {
                green("✔")
            } else {
                yellow("⚠")
            },
            report.processed,
            report.failures.len(),
            bold(&args.output_dir.display().to_string()),
        );
        if !report.tagger_available {
            eprintln!(
                "   {} '{}' not found: files were copied but metadata was not embedded",
                yellow("⚠"),
                args.exiftool
            );
        }
    }
    Ok(())
}

/// Map CLI args to `ProcessingConfig`.
fn build_config(args: &SplitArgs, progress: Option<ProgressCallback>) -> Result<ProcessingConfig> {
    let tools = ToolPaths {
        text_extract: args.tools.pdftotext.clone(),
        document_info: args.tools.pdfinfo.clone(),
        page_range_extract: args.tools.pdftk.clone(),
        rasterize: args.tools.pdftoppm.clone(),
        ocr: args.tools.tesseract.clone(),
        ..ToolPaths::default()
    };

    let mut builder = ProcessingConfig::builder()
        .marker(args.marker.clone())
        .scan_page_limit(args.scan_page_limit)
        .ocr_dpi(args.ocr_dpi)
        .ocr_language(args.ocr_lang.clone())
        .concurrency(args.concurrency)
        .tool_timeout_secs(args.tool_timeout)
        .output_dir(args.output_dir.clone())
        .tools(tools);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
