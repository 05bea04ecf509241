//! Pipeline – ties together parsing, styling, layout, pagination, and
//! rendering of HTML into a single function call.

use crate::dom::{body_children, parse_html};
use crate::error::{Error, Result};
use crate::fonts::FontManager;
use crate::geometry::PageGeometry;
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::pagination::paginate;
use crate::render::render_pdf;
use crate::style::build_styled_tree;

/// Configuration for the markup pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Page size and margins.
    pub geometry: PageGeometry,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "deck-forge output".to_string(),
            geometry: PageGeometry::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(title: impl Into<String>, geometry: PageGeometry) -> Self {
        Self {
            title: title.into(),
            geometry,
        }
    }
}

/// Full pipeline: HTML string → PDF bytes.
///
/// Returns `(pdf_bytes, layout_config)`.
pub fn generate_pdf(html: &str, config: &PipelineConfig) -> Result<(Vec<u8>, LayoutConfig)> {
    let layout_config = compute_layout_config(html, config)?;
    let pdf_bytes = render_pdf(&layout_config)?;
    Ok((pdf_bytes, layout_config))
}

/// Generate only the layout config (no PDF rendering) – useful for testing.
///
/// Markup without any element to lay out is a render error.
pub fn compute_layout_config(html: &str, config: &PipelineConfig) -> Result<LayoutConfig> {
    let dom = parse_html(html);
    let dom_nodes = body_children(&dom);
    let styled = build_styled_tree(&dom_nodes, None);

    let fonts = FontManager::default();
    let boxes = compute_layout(&styled, &config.geometry, &fonts)?;
    if boxes.is_empty() {
        return Err(Error::Render("markup has no renderable content".to_string()));
    }

    let mut layout_config = paginate(&boxes, &config.geometry, &fonts);
    layout_config.title = config.title.clone();
    log::info!(
        "markup laid out on {} pages ({} top-level boxes)",
        layout_config.pages.len(),
        boxes.len()
    );
    Ok(layout_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_basic() {
        let html = "<h1>Hello</h1><p>World</p>";
        let (bytes, config) = generate_pdf(html, &PipelineConfig::default()).unwrap();
        assert!(!bytes.is_empty());
        assert!(!config.pages.is_empty());
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn empty_markup_is_an_error() {
        let html = "<html><head></head><body>  </body></html>";
        let err = compute_layout_config(html, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }
}
