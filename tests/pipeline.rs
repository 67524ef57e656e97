//! Whole-pipeline tests against a scripted tool runner.
//!
//! `FakeTools` plays pdftotext, pdfinfo, pdftk, pdftoppm, tesseract and
//! exiftool over an in-memory model of each document: a list of pages, each
//! with an optional text layer and the text OCR would read off its image.
//! Split and image files are really written, so the filesystem side of the
//! pipeline (output directory, file sizes, temp dir cleanup) is exercised too.

use async_trait::async_trait;
use futures::StreamExt;
use pdf_splitter::{
    process_directory, process_stream, process_to_file, results_path, tag_files, ExtractionMethod,
    MetadataRecord, Operation, ProcessingConfig, ProcessingProgressCallback, StageError,
    ToolInvocation, ToolOutput, ToolRunner,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct Page {
    text: String,
    ocr: String,
}

fn text_page(text: &str) -> Page {
    Page {
        text: text.to_string(),
        ocr: format!("(ocr) {text}"),
    }
}

fn scanned_page(ocr: &str) -> Page {
    Page {
        text: String::new(),
        ocr: ocr.to_string(),
    }
}

#[derive(Default)]
struct FakeTools {
    /// Pages of every known document, keyed by file name.
    docs: Mutex<HashMap<String, Vec<Page>>>,
    /// OCR text for each rendered image.
    images: Mutex<HashMap<PathBuf, String>>,
    /// `(source file name, range)` pairs pdftk refuses.
    fail_ranges: HashSet<(String, String)>,
    /// Delay applied to the marker scan of a source.
    scan_delay: HashMap<String, Duration>,
    tagger_available: bool,
    calls: Mutex<Vec<(Operation, Vec<String>)>>,
}

impl FakeTools {
    fn with_doc(self, name: &str, pages: Vec<Page>) -> Self {
        self.docs.lock().unwrap().insert(name.to_string(), pages);
        self
    }

    fn pages_of(&self, path: &str) -> Option<Vec<Page>> {
        let name = Path::new(path).file_name()?.to_string_lossy().into_owned();
        self.docs.lock().unwrap().get(&name).cloned()
    }

    fn count(&self, op: Operation) -> usize {
        self.calls.lock().unwrap().iter().filter(|(o, _)| *o == op).count()
    }
}

#[async_trait]
impl ToolRunner for FakeTools {
    async fn run(&self, inv: ToolInvocation) -> Result<ToolOutput, StageError> {
        let args = inv.args_lossy();
        self.calls.lock().unwrap().push((inv.operation, args.clone()));

        match inv.operation {
            Operation::TextExtract => {
                let pdf = &args[args.len() - 2];
                let scanning = args[0] == "-f";
                if scanning {
                    let name = Path::new(pdf).file_name().unwrap().to_string_lossy().into_owned();
                    if let Some(delay) = self.scan_delay.get(&name) {
                        tokio::time::sleep(*delay).await;
                    }
                }
                let pages = self
                    .pages_of(pdf)
                    .ok_or_else(|| failed(&inv, "Syntax Error: Couldn't open file"))?;
                // pdftotext ends every page, including the last, with \f
                let mut out = String::new();
                for page in &pages {
                    out.push_str(&page.text);
                    out.push('\u{000C}');
                }
                Ok(ToolOutput::from_stdout(out))
            }
            Operation::DocumentInfo => {
                let pages = self
                    .pages_of(&args[0])
                    .ok_or_else(|| failed(&inv, "Syntax Error: Couldn't open file"))?;
                Ok(ToolOutput::from_stdout(format!(
                    "Producer:       fake\nPages:          {}\nEncrypted:      no\n",
                    pages.len()
                )))
            }
            Operation::PageRangeExtract => {
                let (src, range, out) = (&args[0], &args[2], PathBuf::from(&args[4]));
                let src_name = Path::new(src).file_name().unwrap().to_string_lossy().into_owned();
                if self.fail_ranges.contains(&(src_name, range.clone())) {
                    return Err(failed(&inv, "Error: Unexpected Exception"));
                }
                let pages = self.pages_of(src).ok_or_else(|| failed(&inv, "no such file"))?;
                let (a, b) = range.split_once('-').unwrap();
                let (a, b): (usize, usize) = (a.parse().unwrap(), b.parse().unwrap());
                let slice = pages[a - 1..b].to_vec();

                std::fs::write(&out, vec![b'%'; 100 * slice.len()]).unwrap();
                let out_name = out.file_name().unwrap().to_string_lossy().into_owned();
                self.docs.lock().unwrap().insert(out_name, slice);
                Ok(ToolOutput::default())
            }
            Operation::Rasterize => {
                let pages = self.pages_of(&args[3]).ok_or_else(|| failed(&inv, "no such file"))?;
                for (i, page) in pages.iter().enumerate() {
                    let image = PathBuf::from(format!("{}-{:02}.png", args[4], i + 1));
                    std::fs::write(&image, b"\x89PNG").unwrap();
                    self.images.lock().unwrap().insert(image, page.ocr.clone());
                }
                Ok(ToolOutput::default())
            }
            Operation::Ocr => {
                let image = PathBuf::from(&args[0]);
                assert!(image.exists(), "image must exist while OCR runs");
                let text = self.images.lock().unwrap().get(&image).cloned().unwrap_or_default();
                Ok(ToolOutput::from_stdout(format!("{text}\n")))
            }
            Operation::TagMetadata => Ok(ToolOutput::default()),
        }
    }

    async fn is_available(&self, _program: &str) -> bool {
        self.tagger_available
    }
}

fn failed(inv: &ToolInvocation, detail: &str) -> StageError {
    StageError::ToolFailed {
        operation: inv.operation,
        program: inv.program.clone(),
        detail: detail.to_string(),
    }
}

/// Ten pages with markers on pages 3 and 7.
fn hymnal() -> Vec<Page> {
    (1..=10)
        .map(|n| match n {
            3 | 7 => text_page("SPLITME"),
            n => text_page(&format!("Song page {n}")),
        })
        .collect()
}

struct Workspace {
    _root: tempfile::TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn workspace(sources: &[&str]) -> Workspace {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("pdfs");
    std::fs::create_dir(&input).unwrap();
    for name in sources {
        std::fs::write(input.join(name), b"%PDF-1.7").unwrap();
    }
    let output = root.path().join("extracted_content");
    Workspace {
        _root: root,
        input,
        output,
    }
}

fn config(ws: &Workspace, runner: Arc<FakeTools>) -> ProcessingConfig {
    ProcessingConfig::builder()
        .output_dir(&ws.output)
        .runner(runner)
        .build()
        .unwrap()
}

#[tokio::test]
async fn ten_pages_markers_on_three_and_seven() {
    let ws = workspace(&["hymnal.pdf"]);
    let tools = Arc::new(FakeTools::default().with_doc("hymnal.pdf", hymnal()));
    let cfg = config(&ws, Arc::clone(&tools));

    let summary = process_to_file(&ws.input, &cfg).await.unwrap();
    assert_eq!(summary.documents, 1);
    assert_eq!(summary.split_files, 3);
    assert_eq!(summary.ocr_files, 0);
    assert_eq!(summary.failed_operations, 0);

    let ranges: Vec<String> = tools
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter(|(op, _)| *op == Operation::PageRangeExtract)
        .map(|(_, args)| args[2].clone())
        .collect();
    assert_eq!(ranges, vec!["1-2", "4-6", "8-10"]);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(results_path(&cfg)).unwrap()).unwrap();
    let result = &json[0];
    assert_eq!(result["source_pdf"], "hymnal.pdf");
    assert_eq!(result["total_files_processed"], 3);
    assert!(result["processing_time_seconds"].is_f64());
    assert!(result.get("failures").is_none());

    let splits = result["split_files"].as_array().unwrap();
    let names: Vec<_> = splits.iter().map(|s| s["file_name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["hymnal_part_001.pdf", "hymnal_part_002.pdf", "hymnal_part_003.pdf"]
    );
    let pages: Vec<_> = splits.iter().map(|s| s["page_count"].as_u64().unwrap()).collect();
    assert_eq!(pages, vec![2, 3, 3]);
    assert_eq!(splits[0]["text"], "Song page 1\u{000C}Song page 2");
    assert_eq!(splits[1]["file_size_bytes"], 300);
    assert!(splits[0]["extracted_at"].as_str().unwrap().contains('T'));

    for name in names {
        assert!(ws.output.join(name).exists());
    }
}

#[tokio::test]
async fn scanned_source_goes_through_ocr() {
    let ws = workspace(&["scan.pdf"]);
    let pages = vec![
        scanned_page("Amazing grace"),
        scanned_page("   "),
        scanned_page("how sweet the sound"),
    ];
    let tools = Arc::new(FakeTools::default().with_doc("scan.pdf", pages));
    let cfg = config(&ws, Arc::clone(&tools));

    let output = process_directory(&ws.input, &cfg).await.unwrap();
    let result = &output.results[0];

    // no text layer, so no markers: the whole document is one split
    assert_eq!(result.split_files.len(), 1);
    let split = &result.split_files[0];
    assert_eq!(split.file_name, "scan_part_001.pdf");
    assert_eq!(split.method, ExtractionMethod::Ocr);
    assert_eq!(split.text, "Amazing grace\n\nhow sweet the sound");
    assert_eq!(split.page_count, 3);
    assert_eq!(output.summary.ocr_files, 1);
    assert_eq!(tools.count(Operation::Ocr), 3);

    for image in tools.images.lock().unwrap().keys() {
        assert!(!image.exists(), "OCR images are cleaned up");
    }
}

#[tokio::test]
async fn text_split_never_rasterised() {
    let ws = workspace(&["hymnal.pdf"]);
    let tools = Arc::new(FakeTools::default().with_doc("hymnal.pdf", hymnal()));
    process_directory(&ws.input, &config(&ws, Arc::clone(&tools)))
        .await
        .unwrap();
    assert_eq!(tools.count(Operation::Rasterize), 0);
    assert_eq!(tools.count(Operation::Ocr), 0);
}

#[tokio::test]
async fn no_markers_yields_whole_document() {
    let ws = workspace(&["plain.pdf"]);
    let pages = (1..=4).map(|n| text_page(&format!("p{n}"))).collect();
    let tools = Arc::new(FakeTools::default().with_doc("plain.pdf", pages));

    let output = process_directory(&ws.input, &config(&ws, tools)).await.unwrap();
    let result = &output.results[0];
    assert_eq!(result.total_files_processed, 1);
    assert_eq!(result.split_files[0].page_count, 4);
}

#[tokio::test]
async fn failed_range_is_skipped_and_recorded() {
    let ws = workspace(&["hymnal.pdf"]);
    let mut fake = FakeTools::default().with_doc("hymnal.pdf", hymnal());
    fake.fail_ranges
        .insert(("hymnal.pdf".to_string(), "4-6".to_string()));
    let tools = Arc::new(fake);

    let output = process_directory(&ws.input, &config(&ws, tools)).await.unwrap();
    let result = &output.results[0];

    let names: Vec<_> = result.split_files.iter().map(|s| s.file_name.as_str()).collect();
    assert_eq!(names, vec!["hymnal_part_001.pdf", "hymnal_part_003.pdf"]);
    assert_eq!(result.total_files_processed, 2);
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].is_tool_failure());
    assert_eq!(output.summary.documents_with_failures, 1);
}

#[tokio::test]
async fn unreadable_source_does_not_stop_the_batch() {
    // "a_broken.pdf" exists on disk but the tools cannot read it
    let ws = workspace(&["a_broken.pdf", "hymnal.pdf"]);
    let tools = Arc::new(FakeTools::default().with_doc("hymnal.pdf", hymnal()));

    let output = process_directory(&ws.input, &config(&ws, tools)).await.unwrap();
    assert_eq!(output.results.len(), 2);

    let broken = &output.results[0];
    assert_eq!(broken.source_pdf, "a_broken.pdf");
    assert_eq!(broken.total_files_processed, 0);
    assert_eq!(broken.failures.len(), 2, "scan and page count both failed");

    assert_eq!(output.results[1].total_files_processed, 3);
}

#[tokio::test]
async fn sources_sharing_a_stem_get_distinct_split_files() {
    let ws = workspace(&["a.pdf", "a.PDF"]);
    let tools = Arc::new(
        FakeTools::default()
            .with_doc("a.pdf", vec![text_page("lower one"), text_page("lower two")])
            .with_doc("a.PDF", vec![text_page("upper")]),
    );
    let cfg = ProcessingConfig::builder()
        .output_dir(&ws.output)
        .runner(tools)
        .concurrency(2)
        .build()
        .unwrap();

    let output = process_directory(&ws.input, &cfg).await.unwrap();
    let by_source: HashMap<_, _> = output
        .results
        .iter()
        .map(|r| (r.source_pdf.as_str(), &r.split_files[0]))
        .collect();

    let upper = by_source["a.PDF"];
    let lower = by_source["a.pdf"];
    assert_eq!(upper.file_name, "a_PDF_part_001.pdf");
    assert_eq!(upper.page_count, 1);
    assert_eq!(lower.file_name, "a_pdf_part_001.pdf");
    assert_eq!(lower.page_count, 2);

    let mut on_disk: Vec<_> = std::fs::read_dir(&ws.output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    on_disk.sort();
    assert_eq!(on_disk, vec!["a_PDF_part_001.pdf", "a_pdf_part_001.pdf"]);
    assert_eq!(std::fs::metadata(ws.output.join("a_pdf_part_001.pdf")).unwrap().len(), 200);
}

#[tokio::test]
async fn results_follow_discovery_order_under_concurrency() {
    let ws = workspace(&["a.pdf", "b.pdf", "c.pdf"]);
    let mut fake = FakeTools::default()
        .with_doc("a.pdf", vec![text_page("a")])
        .with_doc("b.pdf", vec![text_page("b")])
        .with_doc("c.pdf", vec![text_page("c")]);
    fake.scan_delay.insert("a.pdf".into(), Duration::from_millis(200));
    fake.scan_delay.insert("b.pdf".into(), Duration::from_millis(50));
    let tools = Arc::new(fake);

    let cfg = ProcessingConfig::builder()
        .output_dir(&ws.output)
        .runner(tools)
        .concurrency(3)
        .build()
        .unwrap();

    let mut stream = process_stream(&ws.input, &cfg).await.unwrap();
    let mut order = Vec::new();
    while let Some(result) = stream.next().await {
        order.push(result.source_pdf);
    }
    assert_eq!(order, vec!["a.pdf", "b.pdf", "c.pdf"]);
}

#[derive(Default)]
struct Counting {
    batch_start: AtomicUsize,
    documents: AtomicUsize,
    splits: AtomicUsize,
    ocr_splits: AtomicUsize,
    errors: AtomicUsize,
    batch_complete: AtomicUsize,
}

impl ProcessingProgressCallback for Counting {
    fn on_batch_start(&self, total: usize) {
        self.batch_start.store(total, Ordering::SeqCst);
    }
    fn on_document_complete(&self, _doc: &str, _splits: usize, _failures: usize, _t: Duration) {
        self.documents.fetch_add(1, Ordering::SeqCst);
    }
    fn on_split_complete(&self, _doc: &str, _file: &str, _len: usize, used_ocr: bool) {
        self.splits.fetch_add(1, Ordering::SeqCst);
        if used_ocr {
            self.ocr_splits.fetch_add(1, Ordering::SeqCst);
        }
    }
    fn on_stage_error(&self, _doc: &str, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
    fn on_batch_complete(&self, _docs: usize, splits: usize) {
        self.batch_complete.store(splits, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_events_match_results() {
    let ws = workspace(&["hymnal.pdf", "scan.pdf"]);
    let mut fake = FakeTools::default()
        .with_doc("hymnal.pdf", hymnal())
        .with_doc("scan.pdf", vec![scanned_page("x")]);
    fake.fail_ranges
        .insert(("hymnal.pdf".to_string(), "8-10".to_string()));
    let counting = Arc::new(Counting::default());

    let cfg = ProcessingConfig::builder()
        .output_dir(&ws.output)
        .runner(Arc::new(fake))
        .progress_callback(counting.clone())
        .build()
        .unwrap();
    process_directory(&ws.input, &cfg).await.unwrap();

    assert_eq!(counting.batch_start.load(Ordering::SeqCst), 2);
    assert_eq!(counting.documents.load(Ordering::SeqCst), 2);
    assert_eq!(counting.splits.load(Ordering::SeqCst), 3);
    assert_eq!(counting.ocr_splits.load(Ordering::SeqCst), 1);
    assert_eq!(counting.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counting.batch_complete.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn split_then_tag_without_tagger() {
    let ws = workspace(&["hymnal.pdf"]);
    let tools = Arc::new(FakeTools::default().with_doc("hymnal.pdf", hymnal()));
    let cfg = config(&ws, Arc::clone(&tools));
    process_to_file(&ws.input, &cfg).await.unwrap();

    let records = vec![MetadataRecord {
        file_name: "hymnal_part_002.pdf".into(),
        title: "Be Thou My Vision".into(),
        genre: "Hymn".into(),
        tags: vec!["irish".into()],
        composer: "Traditional".into(),
        new_filename: "Be Thou My Vision.pdf".into(),
    }];
    let tagged = ws.output.parent().unwrap().join("tagged");
    let report = tag_files(&records, &ws.output, &tagged, &cfg).await.unwrap();

    assert!(!report.tagger_available);
    assert_eq!(report.processed, 1);
    assert!(tagged.join("Be Thou My Vision.pdf").exists());
    assert_eq!(tools.count(Operation::TagMetadata), 0);
}
