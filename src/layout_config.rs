//! Layout config – the intermediate representation between layout and PDF
//! rendering. Both the direct engine and the markup pipeline produce it; it
//! is the "frozen" structure that encodes exactly what goes on each page.

use serde::{Deserialize, Serialize};

use crate::geometry::PageGeometry;

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    /// Visual styling
    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,

    /// Content (mutually exclusive in practice)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    /// Children (nested boxes)
    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text.
    pub lines: Vec<TextLine>,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
    pub text_align: String,
    pub underline: bool,
    /// List bullet/number prefix (e.g. "• " or "1. ")
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (for alignment)
    pub x_offset: f32,
    /// Y offset from the top of the text content area
    pub y_offset: f32,
    /// Individually styled pieces of the line. When empty the whole `text`
    /// is drawn in the enclosing [`TextContent`] font.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<TextSpan>,
}

/// A run of text inside a line with its own font. Offsets are relative to
/// the line origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub x_offset: f32,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// An empty layout for the given page geometry.
    pub fn for_geometry(geometry: &PageGeometry) -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt: geometry.width,
            page_height_pt: geometry.height,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "deck-forge output".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Concatenated text of every line on a page, in drawing order.
    pub fn page_text(&self, page: usize) -> String {
        fn collect(lbox: &LayoutBox, out: &mut Vec<String>) {
            if let Some(text) = &lbox.text {
                for line in &text.lines {
                    out.push(line.text.clone());
                }
            }
            for child in &lbox.children {
                collect(child, out);
            }
        }
        let mut out = Vec::new();
        if let Some(p) = self.pages.get(page) {
            for lbox in &p.boxes {
                collect(lbox, &mut out);
            }
        }
        out.join("\n")
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_are_omitted_from_json_when_empty() {
        let line = TextLine {
            text: "plain".into(),
            x_offset: 0.0,
            y_offset: 0.0,
            spans: Vec::new(),
        };
        let json = serde_json::to_string(&line).unwrap();
        assert!(!json.contains("spans"));
        let back: TextLine = serde_json::from_str(&json).unwrap();
        assert!(back.spans.is_empty());
    }
}
