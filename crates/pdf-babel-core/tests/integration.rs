//! Integration tests for pdf-babel-core
//!
//! These tests verify the end-to-end workflow:
//! - PDF loading and text extraction
//! - Flow pipeline: chunked translation, retry pacing, abort on failure
//! - Layout pipeline: per-block fallback and page composition
//! - Background jobs and their event streams

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream};
use pdf_babel_core::{
    translator::TranslatorInfo, AppConfig, Error, EventSink, FlowPipeline, JobEvent, Lang,
    LayoutPipeline, PdfDocument, Phase, Result, Translator,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

// =============================================================================
// Mock Translator for Testing
// =============================================================================

/// A mock translator that returns predictable translations without network
/// calls. Failures can be scripted per call count or per text content.
struct MockTranslator {
    /// Prefix to add to translations for verification
    prefix: String,
    /// Number of initial translate calls that fail before any succeeds
    fail_first: Mutex<usize>,
    /// Any text containing this marker always fails
    fail_containing: Option<String>,
    /// Detection result; `None` simulates a detection failure
    detect_result: Option<Lang>,
    /// Texts received by translate, in call order
    calls: Mutex<Vec<String>>,
}

impl MockTranslator {
    fn new() -> Self {
        Self {
            prefix: "[T] ".to_string(),
            fail_first: Mutex::new(0),
            fail_containing: None,
            detect_result: Some(Lang::new("fr")),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_first(n: usize) -> Self {
        Self {
            fail_first: Mutex::new(n),
            ..Self::new()
        }
    }

    fn failing_when(marker: &str) -> Self {
        Self {
            fail_containing: Some(marker.to_string()),
            ..Self::new()
        }
    }

    fn without_detection() -> Self {
        Self {
            detect_result: None,
            ..Self::new()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "mock",
            supports_detection: true,
        }
    }

    async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
        self.calls.lock().unwrap().push(text.to_string());

        {
            let mut remaining = self.fail_first.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::TranslationRequest(
                    "mock translation failure".to_string(),
                ));
            }
        }

        if let Some(marker) = &self.fail_containing {
            if text.contains(marker) {
                return Err(Error::TranslationRequest(
                    "mock translation failure".to_string(),
                ));
            }
        }

        Ok(format!("{}{}", self.prefix, text))
    }

    async fn detect(&self, _sample: &str) -> Result<Lang> {
        self.detect_result
            .clone()
            .ok_or_else(|| Error::TranslationRequest("mock detection failure".to_string()))
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// Build a small PDF with one page per entry in `page_texts`.
fn create_test_pdf(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut page_ids = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };

        let content_bytes = content.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

        let page_id = doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]));
        page_ids.push(page_id);
    }

    let page_tree = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
        (
            "Count",
            Object::Integer(i64::try_from(page_ids.len()).unwrap()),
        ),
    ]);
    doc.objects
        .insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

fn load_test_pdf(page_texts: &[&str]) -> PdfDocument {
    PdfDocument::from_bytes(create_test_pdf(page_texts)).expect("Failed to load test PDF")
}

/// Build a one-page PDF with two vertically separated text blocks.
fn create_two_block_pdf(top: &str, bottom: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut operations = Vec::new();
    for (text, y) in [(top, 700), (bottom, 400)] {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![100.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let content = Content { operations };

    let content_bytes = content.encode().unwrap_or_default();
    let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

    let page_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(page_tree_id)),
        ("Contents", Object::Reference(content_id)),
        ("Resources", Object::Reference(resources_id)),
        (
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        ),
    ]));

    let page_tree = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ("Count", Object::Integer(1)),
    ]);
    doc.objects
        .insert(page_tree_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

/// Decompressed content of one page of an output document.
fn page_content(doc: &Document, page_num: u32) -> String {
    let page_id = doc.get_pages()[&page_num];
    let content = doc.get_page_content(page_id).expect("page content");
    String::from_utf8_lossy(&content).into_owned()
}

/// Configuration with an explicit source language (no detection call).
fn test_config() -> AppConfig {
    AppConfig {
        source_lang: Lang::new("fr"),
        ..AppConfig::default()
    }
}

fn flow_pipeline(translator: Arc<MockTranslator>, config: AppConfig) -> FlowPipeline {
    FlowPipeline::new(translator, config)
}

/// Collect everything the sink published during a finished run.
fn drain(rx: &mut mpsc::UnboundedReceiver<JobEvent>) -> Vec<JobEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =============================================================================
// PDF Loading Tests
// =============================================================================

#[test]
fn test_pdf_loads_and_extracts() {
    let doc = load_test_pdf(&["Hello world"]);
    assert_eq!(doc.page_count(), 1);

    let extractor = pdf_babel_core::TextExtractor::new(&doc);
    let text = extractor.document_text().expect("extraction should succeed");
    assert!(text.contains("Hello world"), "got: {text:?}");
}

#[test]
fn test_invalid_pdf_bytes() {
    assert!(PdfDocument::from_bytes(vec![0, 1, 2, 3]).is_err());
}

#[test]
fn test_empty_pdf_bytes() {
    assert!(PdfDocument::from_bytes(vec![]).is_err());
}

// =============================================================================
// Chunked Translation Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_chunk_retry_then_success() {
    let translator = Arc::new(MockTranslator::failing_first(2));
    let config = test_config();
    let pipeline = flow_pipeline(Arc::clone(&translator), config.clone());

    let chunks = vec!["bonjour".to_string()];
    let start = Instant::now();
    let result = pipeline
        .translate_chunks(&chunks, &Lang::new("fr"), &Lang::new("en"), &EventSink::disabled())
        .await
        .expect("third attempt should succeed");

    assert_eq!(result, vec!["[T] bonjour".to_string()]);
    assert_eq!(translator.calls().len(), 3);

    // Two backoff waits between the three attempts, one pause after success
    let expected = Duration::from_secs(
        2 * config.translator.retry_backoff_secs + config.translator.chunk_delay_secs,
    );
    assert_eq!(start.elapsed(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_chunk_failure_aborts_run() {
    let translator = Arc::new(MockTranslator::failing_when("deux"));
    let config = test_config();
    let max_attempts = config.translator.max_attempts;
    let pipeline = flow_pipeline(Arc::clone(&translator), config);

    let chunks = vec!["un".to_string(), "deux".to_string(), "trois".to_string()];
    let result = pipeline
        .translate_chunks(&chunks, &Lang::new("fr"), &Lang::new("en"), &EventSink::disabled())
        .await;

    match result {
        Err(Error::ChunkTranslation {
            chunk, attempts, ..
        }) => {
            // 1-based, like the progress logs
            assert_eq!(chunk, 2);
            assert_eq!(attempts, max_attempts);
        }
        other => panic!("expected chunk failure, got {other:?}"),
    }

    // The chunk after the failing one is never sent
    let calls = translator.calls();
    assert!(!calls.contains(&"trois".to_string()), "calls: {calls:?}");
    assert_eq!(
        calls.iter().filter(|c| *c == "deux").count(),
        max_attempts as usize
    );
}

#[tokio::test(start_paused = true)]
async fn test_chunk_pacing_and_progress_events() {
    let translator = Arc::new(MockTranslator::new());
    let config = test_config();
    let delay = config.translator.chunk_delay_secs;
    let pipeline = flow_pipeline(translator, config);

    let chunks: Vec<String> = (1..=3).map(|i| format!("part {i}")).collect();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let start = Instant::now();
    let result = pipeline
        .translate_chunks(&chunks, &Lang::new("fr"), &Lang::new("en"), &EventSink::new(tx))
        .await
        .expect("all chunks should translate");

    assert_eq!(result.len(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(3 * delay));

    let progress: Vec<(usize, usize)> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            JobEvent::ChunkTranslated { done, total } => Some((done, total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test(start_paused = true)]
async fn test_long_text_splits_into_ordered_chunks() {
    let translator = Arc::new(MockTranslator::new());
    let mut config = test_config();
    config.translator.chunk_size = 10;
    let pipeline = flow_pipeline(Arc::clone(&translator), config);

    let text = "abcdefghij0123456789xyz";
    let chunks = pdf_babel_core::split_into_chunks(text, 10);
    assert_eq!(chunks.len(), 3);

    let result = pipeline
        .translate_chunks(&chunks, &Lang::new("fr"), &Lang::new("en"), &EventSink::disabled())
        .await
        .expect("translation should succeed");

    // Order preserved, nothing dropped
    assert_eq!(translator.calls(), chunks);
    let reassembled: String = result.iter().map(|c| &c[4..]).collect();
    assert_eq!(reassembled, text);
}

// =============================================================================
// Flow Pipeline Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_flow_end_to_end() {
    let translator = Arc::new(MockTranslator::new());
    let doc = load_test_pdf(&["Hello world"]);
    let pipeline = flow_pipeline(translator, test_config());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let bytes = pipeline
        .run(&doc, &EventSink::new(tx))
        .await
        .expect("flow run should succeed");

    assert!(bytes.starts_with(b"%PDF"), "output should be a valid PDF");
    let output = Document::load_mem(&bytes).expect("output should parse");
    assert!(!output.get_pages().is_empty());

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, JobEvent::Phase(Phase::Extracting))));
    assert!(events
        .iter()
        .any(|e| matches!(e, JobEvent::SourceResolved(lang) if lang.as_str() == "fr")));
    // Explicit source language, so detection never runs
    assert!(!events
        .iter()
        .any(|e| matches!(e, JobEvent::Phase(Phase::Detecting))));
}

#[tokio::test(start_paused = true)]
async fn test_flow_detects_source_language() {
    let translator = Arc::new(MockTranslator::new());
    let doc = load_test_pdf(&["Bonjour le monde"]);
    let pipeline = flow_pipeline(translator, AppConfig::default());

    let (tx, mut rx) = mpsc::unbounded_channel();
    pipeline
        .run(&doc, &EventSink::new(tx))
        .await
        .expect("flow run should succeed");

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, JobEvent::Phase(Phase::Detecting))));
    assert!(events
        .iter()
        .any(|e| matches!(e, JobEvent::SourceResolved(lang) if lang.as_str() == "fr")));
}

#[tokio::test(start_paused = true)]
async fn test_flow_detection_failure_falls_back() {
    let translator = Arc::new(MockTranslator::without_detection());
    let doc = load_test_pdf(&["Hello world"]);
    let pipeline = flow_pipeline(translator, AppConfig::default());

    let (tx, mut rx) = mpsc::unbounded_channel();
    pipeline
        .run(&doc, &EventSink::new(tx))
        .await
        .expect("detection failure must not fail the run");

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        JobEvent::SourceResolved(lang) if lang.as_str() == pdf_babel_core::DETECTION_FALLBACK_LANG
    )));
}

#[tokio::test(start_paused = true)]
async fn test_flow_multipage_chunked_end_to_end() {
    let translator = Arc::new(MockTranslator::new());

    // Two full pages and a short third one; with the reduced chunk size the
    // extracted text splits into two full chunks and a small final one.
    let page_a = "a".repeat(57);
    let page_b = "b".repeat(57);
    let page_c = "c".repeat(11);
    let doc = load_test_pdf(&[&page_a, &page_b, &page_c]);

    let mut config = test_config();
    config.translator.chunk_size = 60;

    let text = pdf_babel_core::TextExtractor::new(&doc)
        .document_text()
        .expect("extraction should succeed");
    let expected_chunks = pdf_babel_core::split_into_chunks(&text, 60);
    assert_eq!(expected_chunks.len(), 3);
    assert_eq!(expected_chunks[0].chars().count(), 60);
    assert_eq!(expected_chunks[1].chars().count(), 60);
    assert!(expected_chunks[2].chars().count() < 60);

    let pipeline = flow_pipeline(Arc::clone(&translator), config);
    let bytes = pipeline
        .run(&doc, &EventSink::disabled())
        .await
        .expect("flow run should succeed");

    // The extraction → chunker → translator path saw exactly those chunks,
    // in order; reassembly is their in-order concatenation.
    assert_eq!(translator.calls(), expected_chunks);

    let output = Document::load_mem(&bytes).expect("output should parse");
    assert!(!output.get_pages().is_empty());
    let content = page_content(&output, 1);
    assert!(content.contains("[T]"), "translated text should be rendered");
}

// =============================================================================
// Layout Pipeline Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_layout_end_to_end() {
    let translator = Arc::new(MockTranslator::new());
    let doc = load_test_pdf(&["First page text", "Second page text"]);
    let pipeline = LayoutPipeline::new(translator, test_config());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let bytes = pipeline
        .run(&doc, &EventSink::new(tx))
        .await
        .expect("layout run should succeed");

    assert!(bytes.starts_with(b"%PDF"));
    let output = Document::load_mem(&bytes).expect("output should parse");
    assert_eq!(output.get_pages().len(), 2, "page count must match input");

    let progress: Vec<(usize, usize)> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            JobEvent::PageComposed { done, total } => Some((done, total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 2), (2, 2)]);
}

#[tokio::test(start_paused = true)]
async fn test_layout_block_failure_keeps_source_text() {
    // Every block fails to translate; the run must still complete
    let translator = Arc::new(MockTranslator::failing_when("page"));
    let doc = load_test_pdf(&["First page text", "Second page text"]);
    let pipeline = LayoutPipeline::new(Arc::clone(&translator) as Arc<dyn Translator>, test_config());

    let bytes = pipeline
        .run(&doc, &EventSink::disabled())
        .await
        .expect("block failures must not fail the run");

    let output = Document::load_mem(&bytes).expect("output should parse");
    assert_eq!(output.get_pages().len(), 2);
    assert_eq!(translator.calls().len(), 2, "one attempt per block");

    // The untranslated source text still lands in the page content
    let content = page_content(&output, 1);
    assert!(content.contains("First"), "content: {content}");
}

#[tokio::test(start_paused = true)]
async fn test_layout_mixed_blocks_fall_back_individually() {
    // One page, two blocks; only the second block's translation fails
    let translator = Arc::new(MockTranslator::failing_when("beta"));
    let doc = PdfDocument::from_bytes(create_two_block_pdf("alpha ridge", "beta valley"))
        .expect("Failed to load test PDF");
    let pipeline = LayoutPipeline::new(Arc::clone(&translator) as Arc<dyn Translator>, test_config());

    let bytes = pipeline
        .run(&doc, &EventSink::disabled())
        .await
        .expect("a failing block must not fail the run");

    let output = Document::load_mem(&bytes).expect("output should parse");
    let content = page_content(&output, 1);

    // First block drawn translated
    assert!(content.contains("[T]"), "content: {content}");
    assert!(content.contains("alpha") && content.contains("ridge"));
    // Second block drawn with its source text, untranslated
    assert!(content.contains("beta") && content.contains("valley"));
    assert!(!content.contains("[T] beta"));

    assert_eq!(translator.calls().len(), 2, "one attempt per block");
}

// =============================================================================
// Background Job Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_spawn_flow_job_writes_output() {
    let translator = Arc::new(MockTranslator::new());
    let doc = load_test_pdf(&["Hello world"]);
    let pipeline = flow_pipeline(translator, test_config());

    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("out.pdf");

    let mut rx = pdf_babel_core::spawn_flow_job(pipeline, doc, output.clone());

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }

    match last {
        Some(JobEvent::Completed { output: reported }) => assert_eq!(reported, output),
        other => panic!("expected Completed, got {other:?}"),
    }

    let written = std::fs::read(&output).expect("output file should exist");
    assert!(written.starts_with(b"%PDF"));
}

#[tokio::test(start_paused = true)]
async fn test_spawn_flow_job_reports_failure() {
    let translator = Arc::new(MockTranslator::failing_first(usize::MAX));
    let doc = load_test_pdf(&["Hello world"]);
    let pipeline = flow_pipeline(translator, test_config());

    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("out.pdf");

    let mut rx = pdf_babel_core::spawn_flow_job(pipeline, doc, output.clone());

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }

    match last {
        Some(JobEvent::Failed { error }) => {
            assert!(error.contains("failed after"), "got: {error}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(!output.exists(), "no output on failure");
}
