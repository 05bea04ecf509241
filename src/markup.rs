//! Markup conversion – HTML in, PDF out through the markup pipeline.
//!
//! [`to_html`] serialises a block sequence into inline-styled HTML so both
//! markup-based strategies can render the same documents as the direct
//! engine. Lengths are emitted in points.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::content::{ContentBlock, Document, TableData, TableRules};
use crate::dom::{document_title, parse_html};
use crate::error::{Error, Result};
use crate::fallback::{open_for_manual_print, Viewer};
use crate::geometry::PageGeometry;
use crate::pipeline::{generate_pdf, PipelineConfig};
use crate::renderer::{write_output, OutputReport, Rendered, Renderer};
use crate::theme::{BlockStyle, StyleName, Theme};

/// Escape text for an HTML text node or attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn pt(v: f32) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    // Values that round to zero keep their sign in `format!`.
    let s = if s == "-0" { "0" } else { s };
    format!("{s}pt")
}

fn tag_for(style: StyleName) -> &'static str {
    match style {
        StyleName::Title => "h1",
        StyleName::SectionHeading => "h2",
        StyleName::SubsectionHeading => "h3",
        StyleName::MinorHeading => "h4",
        _ => "p",
    }
}

/// Inline CSS for a text block. Background padding is cancelled by negative
/// margins so it stays outside the block's flow height.
fn block_css(style: &BlockStyle) -> String {
    let decorated = style.background.is_some() || style.border.is_some();
    let pad = if decorated { style.border_padding } else { 0.0 };
    let mut css = format!(
        "margin: {} {} {} {}; ",
        pt(style.space_before - pad),
        pt(-pad),
        pt(style.space_after - pad),
        pt(style.left_indent - pad)
    );
    let _ = write!(
        css,
        "font-family: {}; font-size: {}; line-height: {}; font-weight: {}; font-style: {}; color: {}; text-align: {}",
        style.font_family,
        pt(style.font_size),
        pt(style.leading),
        if style.bold { "bold" } else { "normal" },
        if style.italic { "italic" } else { "normal" },
        style.color.to_hex(),
        style.alignment.as_css(),
    );
    if let Some(bg) = style.background {
        let _ = write!(css, "; background-color: {}", bg.to_hex());
    }
    if let Some(border) = style.border {
        let _ = write!(css, "; border: {} solid {}", pt(border.width), border.color.to_hex());
    }
    if decorated {
        let _ = write!(css, "; padding: {}", pt(pad));
    }
    css
}

fn cell_css(
    style: &BlockStyle,
    rules: &TableRules,
    width: f32,
    row: usize,
    column: usize,
) -> String {
    let header = row == 0;
    let bottom = if header {
        rules.header_padding_bottom
    } else {
        rules.padding_bottom
    };
    let mut css = format!(
        "width: {}; padding: {} {} {} {}; font-family: {}; font-size: {}; line-height: {}; font-weight: {}; text-align: {}; vertical-align: {}",
        pt(width),
        pt(rules.padding_top),
        pt(rules.padding_x),
        pt(bottom),
        pt(rules.padding_x),
        style.font_family,
        pt(style.font_size),
        pt(style.leading),
        if style.bold { "bold" } else { "normal" },
        rules.alignment(column).as_css(),
        rules.valign.as_css(),
    );
    let (color, background) = if header {
        (rules.header_text, Some(rules.header_background))
    } else {
        (style.color, rules.row_background(row))
    };
    let _ = write!(css, "; color: {}", color.to_hex());
    if let Some(bg) = background {
        let _ = write!(css, "; background-color: {}", bg.to_hex());
    }
    if rules.grid_width > 0.0 {
        let _ = write!(css, "; border: {} solid {}", pt(rules.grid_width), rules.grid_color.to_hex());
    }
    css
}

fn write_table(
    out: &mut String,
    data: &TableData,
    rules: &TableRules,
    theme: &Theme,
    geometry: &PageGeometry,
) -> Result<()> {
    let header = theme.style(StyleName::TableHeader)?;
    let cell = theme.style(StyleName::TableCell)?;
    let frame = geometry.content_width();
    let widths = rules.resolve_widths(data.column_count(), frame);
    let total: f32 = widths.iter().sum();
    let indent = ((frame - total) / 2.0).max(0.0);
    let _ = write!(
        out,
        "<table style=\"width: {}; margin: 0 0 0 {}; border-collapse: collapse\">",
        pt(total),
        pt(indent)
    );
    for (r, row) in data.rows().iter().enumerate() {
        out.push_str("<tr>");
        let (tag, style) = if data.is_header(r) {
            ("th", header)
        } else {
            ("td", cell)
        };
        for (c, (text, width)) in row.iter().zip(&widths).enumerate() {
            let body = escape(text).replace('\n', "<br/>");
            let _ = write!(
                out,
                "<{tag} style=\"{}\">{body}</{tag}>",
                cell_css(style, rules, *width, r, c)
            );
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    Ok(())
}

/// Serialise a document into a standalone HTML page.
pub fn to_html(doc: &Document, geometry: &PageGeometry) -> Result<String> {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body style=\"margin: 0\">",
        escape(&doc.title)
    );
    // Pagination ignores a break on a page with nothing on it yet.
    let mut blank_page = true;
    for block in &doc.blocks {
        blank_page &= matches!(block, ContentBlock::PageBreak);
        match block {
            ContentBlock::Heading { text, style } | ContentBlock::Paragraph { text, style } => {
                let tag = tag_for(*style);
                let css = block_css(doc.theme.style(*style)?);
                let _ = write!(out, "<{tag} style=\"{css}\">{text}</{tag}>");
            }
            ContentBlock::Preformatted { text, style } => {
                let css = block_css(doc.theme.style(*style)?);
                let _ = write!(out, "<pre style=\"{css}\">{}</pre>", escape(text));
            }
            ContentBlock::Table { data, rules } => {
                write_table(&mut out, data, rules, &doc.theme, geometry)?;
            }
            ContentBlock::PageBreak => {
                if blank_page {
                    out.push_str("<div style=\"height: 0pt\"></div>");
                }
                out.push_str("<div style=\"page-break-before: always\"></div>");
                blank_page = true;
            }
            ContentBlock::Spacer { height } => {
                let _ = write!(out, "<div style=\"height: {}\"></div>", pt(*height));
            }
        }
    }
    out.push_str("</body></html>");
    Ok(out)
}

/// Renders through the markup pipeline.
#[derive(Debug, Clone)]
pub struct MarkupConverter {
    /// Page geometry for markup files; hand-written markup carries its own
    /// sheet padding, so the default has no margins.
    pub file_geometry: PageGeometry,
}

impl Default for MarkupConverter {
    fn default() -> Self {
        Self {
            file_geometry: PageGeometry::a4(),
        }
    }
}

impl Renderer for MarkupConverter {
    fn render(&self, doc: &Document, geometry: &PageGeometry) -> Result<Rendered> {
        let html = to_html(doc, geometry)?;
        self.render_markup(&html, &PipelineConfig::new(doc.title.clone(), *geometry))
    }
}

impl MarkupConverter {
    fn render_markup(&self, html: &str, config: &PipelineConfig) -> Result<Rendered> {
        let (bytes, layout) = generate_pdf(html, config)?;
        Ok(Rendered {
            bytes,
            pages: Some(layout.pages.len()),
        })
    }

    /// Convert a markup file on disk to a PDF at `output`.
    pub fn convert_file(&self, source: &Path, output: &Path) -> Result<OutputReport> {
        let html = fs::read_to_string(source).map_err(|e| Error::io(source, e))?;
        let title = document_title(&parse_html(&html)).unwrap_or_else(|| {
            source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        log::info!("converting {} ({title})", source.display());
        let rendered = self.render_markup(&html, &PipelineConfig::new(title, self.file_geometry))?;
        write_output(output, &rendered)
    }
}

/// How a conversion with fallback ended.
#[derive(Debug)]
pub enum ConversionOutcome {
    Converted(OutputReport),
    /// Conversion failed and the source was handed to the viewer.
    FellBack { error: Error },
}

/// Convert `source`; on any failure print the error and open the source in
/// `viewer` for a manual print. Never retries.
pub fn convert_with_fallback(
    converter: &MarkupConverter,
    source: &Path,
    output: &Path,
    viewer: &dyn Viewer,
) -> ConversionOutcome {
    match converter.convert_file(source, output) {
        Ok(report) => ConversionOutcome::Converted(report),
        Err(error) => {
            println!("\u{2717} Error: {error}");
            open_for_manual_print(source, viewer);
            ConversionOutcome::FellBack { error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DocumentBuilder;
    use crate::geometry::CM;
    use crate::renderer::DirectRenderer;
    use crate::theme::Palette;

    fn doc() -> Document {
        let theme = Theme::build(&Palette::executive());
        let rules = TableRules::from_theme(&theme, &[3.0 * CM, 4.0 * CM]);
        let mut b = DocumentBuilder::new("Deck & Co", theme);
        b.heading("The Problem", StyleName::SectionHeading)
            .paragraph("<b>Result:</b> costs")
            .table(TableData::new([["Metric", "Target"], ["time", "<5 minutes"]]), rules)
            .page_break()
            .preformatted("a < b\n  c", StyleName::Code)
            .spacer(8.5);
        b.build().unwrap()
    }

    #[test]
    fn emits_inline_point_styles() {
        let html = to_html(&doc(), &PageGeometry::a4().uniform(2.0 * CM)).unwrap();
        assert!(html.contains("<title>Deck &amp; Co</title>"));
        assert!(html.contains("<h2 style=\""));
        assert!(html.contains("font-size: 12pt; line-height: 15pt"));
        assert!(html.contains("<p style=\"margin: 0pt 0pt 4pt 0pt; "));
        assert!(html.contains("<b>Result:</b> costs"));
        assert!(html.contains("&lt;5 minutes"));
        assert!(html.contains("<div style=\"page-break-before: always\"></div>"));
        assert!(html.contains("<pre style=\"margin: -4pt -4pt 0pt 6pt; "));
        assert!(html.contains("a &lt; b\n  c</pre>"));
        assert!(html.contains("<div style=\"height: 8.5pt\"></div>"));
        assert!(!html.contains("> <"), "no whitespace between block tags");
    }

    #[test]
    fn emitted_markup_renders_with_a_break() {
        let rendered = MarkupConverter::default()
            .render(&doc(), &PageGeometry::a4().uniform(2.0 * CM))
            .unwrap();
        assert_eq!(&rendered.bytes[..5], b"%PDF-");
        assert_eq!(rendered.pages, Some(2));
    }

    #[test]
    fn point_values_drop_trailing_zeros_and_negative_zero() {
        assert_eq!(pt(-0.0), "0pt");
        assert_eq!(pt(-0.001), "0pt");
        assert_eq!(pt(8.5), "8.5pt");
        assert_eq!(pt(-4.0), "-4pt");
        assert_eq!(pt(100.0), "100pt");
    }

    #[test]
    fn leading_break_still_starts_a_new_page() {
        let theme = Theme::build(&Palette::executive());
        let mut b = DocumentBuilder::new("Breaks", theme);
        b.page_break().paragraph("after the break");
        let doc = b.build().unwrap();
        let geometry = PageGeometry::a4().uniform(2.0 * CM);

        let html = to_html(&doc, &geometry).unwrap();
        assert!(html.contains("<div style=\"height: 0pt\"></div><div style=\"page-break-before: always\">"));

        let markup = MarkupConverter::default().render(&doc, &geometry).unwrap();
        let direct = DirectRenderer.render(&doc, &geometry).unwrap();
        assert_eq!(markup.pages, Some(2));
        assert_eq!(markup.pages, direct.pages);
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MarkupConverter::default()
            .convert_file(&dir.path().join("missing.html"), &dir.path().join("out.pdf"))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
        assert!(!dir.path().join("out.pdf").exists());
    }
}
