//! Integration tests for the deck-forge strategies.
//!
//! These tests validate:
//! - Every strategy writes a valid PDF at the requested path
//! - Layout is deterministic for a given theme and content
//! - Page breaks and table splits paginate as expected
//! - Failed markup conversion hands the source to the viewer once

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use deck_forge::browser::{BrowserConfig, BrowserPrinter};
use deck_forge::decks::{executive, executive_summary, technical, technical_overview};
use deck_forge::fallback::Viewer;
use deck_forge::flow::layout_document;
use deck_forge::layout_config::{LayoutBox, LayoutConfig};
use deck_forge::markup::{convert_with_fallback, ConversionOutcome, MarkupConverter};
use deck_forge::paths;
use deck_forge::pipeline::{compute_layout_config, PipelineConfig};
use deck_forge::render::render_pdf;
use deck_forge::renderer::write_output;
use deck_forge::{
    DirectRenderer, Document, DocumentBuilder, ErrorKind, PageGeometry, Palette, Renderer,
    StyleName, TableData, TableRules, Theme, CM,
};

// =====================================================================
// Helpers
// =====================================================================

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn geometry() -> PageGeometry {
    PageGeometry::a4().uniform(2.0 * CM)
}

fn layout_hash(config: &LayoutConfig) -> String {
    let digest = Sha256::digest(config.to_json().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn short_document(breaks: usize) -> Document {
    let mut b = DocumentBuilder::new("Breaks", Theme::build(&Palette::executive()));
    b.heading("Section", StyleName::SectionHeading);
    for i in 0..breaks {
        b.paragraph(format!("before break {i}")).page_break();
    }
    b.paragraph("last page");
    b.build().unwrap()
}

/// Counts invocations and always fails to launch, like a headless host.
struct CountingViewer(Cell<usize>);

impl Viewer for CountingViewer {
    fn open(&self, _path: &Path) -> io::Result<()> {
        self.0.set(self.0.get() + 1);
        Err(io::Error::new(io::ErrorKind::NotFound, "no display"))
    }
}

fn browser_available() -> bool {
    match BrowserConfig::default().locate() {
        Ok(_) => true,
        Err(e) => {
            eprintln!("skipping browser test: {e}");
            false
        }
    }
}

fn visit_box(lbox: &LayoutBox, f: &mut dyn FnMut(&LayoutBox)) {
    f(lbox);
    for child in &lbox.children {
        visit_box(child, f);
    }
}

// =====================================================================
// Direct layout strategy
// =====================================================================

#[test]
fn executive_summary_renders_two_pages_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join(paths::EXECUTIVE_SUMMARY_PDF);
    let doc = executive_summary().unwrap();

    let report = DirectRenderer
        .render_to_file(&doc, &executive::geometry(), &out)
        .unwrap();

    let bytes = fs::read(&out).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(report.pages, Some(2));
    assert_eq!(report.size_bytes, bytes.len() as u64);
    assert_eq!(
        report.lines()[0],
        "\u{2713} PDF generated successfully: Regulatory_Package_Manager_Executive_Summary.pdf"
    );
}

#[test]
fn technical_overview_renders_every_section() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(paths::TECHNICAL_OVERVIEW_PDF);
    let doc = technical_overview(NaiveDate::from_ymd_opt(2024, 11, 18).unwrap()).unwrap();

    let report = DirectRenderer
        .render_to_file(&doc, &technical::geometry(), &out)
        .unwrap();

    assert_valid_pdf(&fs::read(&out).unwrap());
    let pages = report.pages.unwrap();
    assert!(pages > doc.page_breaks(), "{pages} pages for {} breaks", doc.page_breaks());

    let layout = layout_document(&doc, &technical::geometry()).unwrap();
    let last = layout.page_text(layout.pages.len() - 1);
    assert!(last.contains("Document Version 1.0 | November 2024"));
}

#[test]
fn page_count_is_breaks_plus_one() {
    for breaks in [0, 1, 3] {
        let doc = short_document(breaks);
        let layout = layout_document(&doc, &geometry()).unwrap();
        assert_eq!(layout.pages.len(), breaks + 1, "{breaks} breaks");
    }
}

#[test]
fn same_theme_and_content_give_identical_layouts() {
    assert_eq!(
        Theme::build(&Palette::executive()),
        Theme::build(&Palette::executive())
    );
    let a = layout_document(&executive_summary().unwrap(), &executive::geometry()).unwrap();
    let b = layout_document(&executive_summary().unwrap(), &executive::geometry()).unwrap();
    assert_eq!(layout_hash(&a), layout_hash(&b));

    let other = layout_document(&executive_summary().unwrap(), &geometry().uniform(3.0 * CM))
        .unwrap();
    assert_ne!(layout_hash(&a), layout_hash(&other));
}

#[test]
fn tables_keep_their_shape() {
    let theme = Theme::build(&Palette::technical());
    for (rows, cols) in [(1usize, 1usize), (3, 2), (7, 4)] {
        let data = TableData::new((0..rows).map(|r| (0..cols).map(move |c| format!("r{r}c{c}"))));
        assert_eq!(data.row_count(), rows);
        assert_eq!(data.column_count(), cols);
        assert!(data.is_header(0));
        assert!(!data.is_header(1));

        let rules = TableRules::from_theme(&theme, &vec![3.0 * CM; cols]);
        let mut b = DocumentBuilder::new("Shape", theme.clone());
        b.table(data, rules);
        let layout = layout_document(&b.build().unwrap(), &geometry()).unwrap();
        let text = layout.page_text(0);
        assert!(text.contains(&format!("r{}c{}", rows - 1, cols - 1)), "{text}");
    }
}

#[test]
fn split_table_repeats_header_on_each_page() {
    let theme = Theme::build(&Palette::executive());
    let rows = std::iter::once(vec!["Metric".to_string(), "Target".to_string()])
        .chain((0..150).map(|i| vec![format!("metric {i}"), format!("{i}%")]));
    let rules = TableRules::from_theme(&theme, &[5.0 * CM, 5.0 * CM]);
    let mut b = DocumentBuilder::new("Long table", theme);
    b.heading("Success Metrics", StyleName::SectionHeading)
        .table(TableData::new(rows), rules);
    let layout = layout_document(&b.build().unwrap(), &geometry()).unwrap();

    assert!(layout.pages.len() >= 2);
    for page in 1..layout.pages.len() {
        assert!(
            layout.page_text(page).starts_with("Metric\nTarget"),
            "page {page}"
        );
    }
    let all: String = (0..layout.pages.len()).map(|p| layout.page_text(p)).collect();
    assert!(all.contains("metric 149"));
}

#[test]
fn layout_survives_json_round_trip() {
    let layout = layout_document(&executive_summary().unwrap(), &executive::geometry()).unwrap();
    let parsed = LayoutConfig::from_json(&layout.to_json()).unwrap();
    assert_eq!(parsed.pages.len(), 2);
    assert_eq!(parsed.title, executive::TITLE);
    assert_eq!(layout_hash(&layout), layout_hash(&parsed));
    assert_valid_pdf(&render_pdf(&parsed).unwrap());
}

#[test]
fn unwritable_output_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"x").unwrap();

    let err = DirectRenderer
        .render_to_file(&short_document(0), &geometry(), &blocker.join("out.pdf"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

// =====================================================================
// Markup conversion strategy
// =====================================================================

#[test]
fn shipped_markup_converts_to_two_pages() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(paths::MARKUP_SUMMARY_PDF);
    let viewer = CountingViewer(Cell::new(0));

    let outcome = convert_with_fallback(
        &MarkupConverter::default(),
        &paths::markup_source(),
        &out,
        &viewer,
    );

    match outcome {
        ConversionOutcome::Converted(report) => {
            assert_eq!(report.pages, Some(2));
            assert_valid_pdf(&fs::read(&report.path).unwrap());
        }
        ConversionOutcome::FellBack { error } => panic!("conversion failed: {error}"),
    }
    assert_eq!(viewer.0.get(), 0);
}

#[test]
fn markup_renderer_matches_direct_page_count() {
    let doc = short_document(2);
    let rendered = MarkupConverter::default().render(&doc, &geometry()).unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.pages, Some(3));
}

#[test]
fn missing_markup_falls_back_once() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.pdf");
    let viewer = CountingViewer(Cell::new(0));

    let outcome = convert_with_fallback(
        &MarkupConverter::default(),
        &dir.path().join("missing.html"),
        &out,
        &viewer,
    );

    match outcome {
        ConversionOutcome::FellBack { error } => assert_eq!(error.kind(), ErrorKind::Io),
        ConversionOutcome::Converted(_) => panic!("missing source converted"),
    }
    assert_eq!(viewer.0.get(), 1);
    assert!(!out.exists());
}

#[test]
fn empty_markup_falls_back_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("empty.html");
    fs::write(&source, "<html><head><title>Empty</title></head><body></body></html>").unwrap();
    let viewer = CountingViewer(Cell::new(0));

    let outcome = convert_with_fallback(
        &MarkupConverter::default(),
        &source,
        &dir.path().join("out.pdf"),
        &viewer,
    );

    match outcome {
        ConversionOutcome::FellBack { error } => assert_eq!(error.kind(), ErrorKind::Render),
        ConversionOutcome::Converted(_) => panic!("empty markup converted"),
    }
    assert_eq!(viewer.0.get(), 1);
}

#[test]
fn data_uri_image_is_laid_out() {
    let html = r#"<p>Logo</p><img src="data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==" style="width: 40pt; height: 20pt" />"#;
    let config = compute_layout_config(html, &PipelineConfig::new("Logo", geometry())).unwrap();

    let mut found = false;
    for page in &config.pages {
        for lbox in &page.boxes {
            visit_box(lbox, &mut |b| {
                if let Some(img) = &b.image {
                    assert!(img.src.starts_with("data:image/png"));
                    found = true;
                }
            });
        }
    }
    assert!(found, "image box missing");
    assert_valid_pdf(&render_pdf(&config).unwrap());
}

#[test]
fn written_output_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("deck.pdf");
    fs::write(&out, b"stale").unwrap();

    let rendered = DirectRenderer.render(&short_document(1), &geometry()).unwrap();
    let report = write_output(&out, &rendered).unwrap();

    assert_eq!(report.pages, Some(2));
    assert_valid_pdf(&fs::read(&out).unwrap());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "temp file left behind");
}

// =====================================================================
// Browser print strategy (skipped without Chromium)
// =====================================================================

#[test]
fn browser_prints_shipped_markup() {
    if !browser_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(paths::MARKUP_SUMMARY_PDF);
    let report = BrowserPrinter::default()
        .print_file(&paths::markup_source(), &out)
        .unwrap();
    assert_valid_pdf(&fs::read(&out).unwrap());
    assert_eq!(report.pages, Some(2));
}

#[test]
fn browser_renders_document_blocks() {
    if !browser_available() {
        return;
    }
    let doc = short_document(1);
    let rendered = BrowserPrinter::default().render(&doc, &geometry()).unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert_eq!(rendered.pages, Some(2));
}
