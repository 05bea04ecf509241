//! Content assembler – the ordered, typed block sequence a document is made
//! of, and the builder the document scripts use to produce it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::style::{Color, TextAlign};
use crate::theme::{StyleName, Theme};

/// Vertical placement of cell text inside a taller row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Middle,
    #[default]
    Bottom,
}

impl VAlign {
    pub fn as_css(&self) -> &'static str {
        match self {
            VAlign::Top => "top",
            VAlign::Middle => "middle",
            VAlign::Bottom => "bottom",
        }
    }
}

/// Per-region formatting for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRules {
    /// Column widths in points. Missing columns share what is left of the
    /// frame width. Sums are not checked against the frame.
    pub column_widths: Vec<f32>,
    /// Horizontal alignment per column; columns past the end use
    /// `default_alignment`.
    pub alignments: Vec<TextAlign>,
    pub default_alignment: TextAlign,
    pub valign: VAlign,
    pub header_background: Color,
    pub header_text: Color,
    pub body_background: Option<Color>,
    /// Alternating body row backgrounds, starting with the first body row.
    /// Takes precedence over `body_background`.
    pub zebra: Option<(Color, Color)>,
    pub grid_width: f32,
    pub grid_color: Color,
    pub padding_x: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub header_padding_bottom: f32,
}

impl TableRules {
    /// Theme defaults with the given column widths.
    pub fn from_theme(theme: &Theme, column_widths: &[f32]) -> Self {
        let t = &theme.table;
        Self {
            column_widths: column_widths.to_vec(),
            alignments: Vec::new(),
            default_alignment: TextAlign::Left,
            valign: VAlign::default(),
            header_background: t.header_background,
            header_text: t.header_text,
            body_background: t.body_background,
            zebra: t.zebra,
            grid_width: t.grid_width,
            grid_color: t.grid_color,
            padding_x: t.padding_x,
            padding_top: t.padding_top,
            padding_bottom: t.padding_bottom,
            header_padding_bottom: t.header_padding_bottom,
        }
    }

    /// Align every column the same way.
    pub fn align(mut self, align: TextAlign) -> Self {
        self.alignments.clear();
        self.default_alignment = align;
        self
    }

    pub fn align_column(mut self, column: usize, align: TextAlign) -> Self {
        if self.alignments.len() <= column {
            self.alignments.resize(column + 1, self.default_alignment);
        }
        self.alignments[column] = align;
        self
    }

    pub fn valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }

    pub fn body_background(mut self, color: Color) -> Self {
        self.body_background = Some(color);
        self
    }

    pub fn alignment(&self, column: usize) -> TextAlign {
        self.alignments
            .get(column)
            .copied()
            .unwrap_or(self.default_alignment)
    }

    /// Background of body row `index` (1-based, row 0 is the header).
    pub fn row_background(&self, index: usize) -> Option<Color> {
        match self.zebra {
            Some((odd, even)) => Some(if index % 2 == 1 { odd } else { even }),
            None => self.body_background,
        }
    }

    /// Resolve widths for `columns` columns inside `frame_width` points.
    pub fn resolve_widths(&self, columns: usize, frame_width: f32) -> Vec<f32> {
        let given: Vec<f32> = self.column_widths.iter().copied().take(columns).collect();
        if given.len() == columns {
            return given;
        }
        let used: f32 = given.iter().sum();
        let share = ((frame_width - used) / (columns - given.len()) as f32).max(0.0);
        let mut widths = given;
        widths.resize(columns, share);
        widths
    }
}

/// A rectangular matrix of cell strings. Row 0 is the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    rows: Vec<Vec<String>>,
    columns: usize,
}

impl TableData {
    /// Build from rows of cells. Ragged rows are padded with empty cells to
    /// the widest row.
    pub fn new<R, C>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let mut rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(columns, String::new());
        }
        Self { rows, columns }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn is_header(&self, row: usize) -> bool {
        row == 0 && !self.rows.is_empty()
    }
}

/// One renderable unit, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { text: String, style: StyleName },
    /// Text with inline markup.
    Paragraph { text: String, style: StyleName },
    Table { data: TableData, rules: TableRules },
    /// Verbatim text: line breaks and indentation are kept, nothing wraps.
    Preformatted { text: String, style: StyleName },
    PageBreak,
    /// Fixed vertical gap in points.
    Spacer { height: f32 },
}

impl ContentBlock {
    /// Styles the block refers to.
    pub fn styles(&self) -> Vec<StyleName> {
        match self {
            ContentBlock::Heading { style, .. }
            | ContentBlock::Paragraph { style, .. }
            | ContentBlock::Preformatted { style, .. } => vec![*style],
            ContentBlock::Table { .. } => vec![StyleName::TableHeader, StyleName::TableCell],
            ContentBlock::PageBreak | ContentBlock::Spacer { .. } => Vec::new(),
        }
    }
}

/// A title, the theme its blocks refer to, and the blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    pub theme: Theme,
    pub blocks: Vec<ContentBlock>,
}

impl Document {
    pub fn page_breaks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, ContentBlock::PageBreak))
            .count()
    }

    /// Check that every block refers to a style the theme defines.
    pub fn validate(&self) -> Result<()> {
        for (block, b) in self.blocks.iter().enumerate() {
            for style in b.styles() {
                if !self.theme.contains(style) {
                    return Err(Error::MissingStyle { style, block });
                }
            }
        }
        Ok(())
    }
}

/// Appends blocks in reading order.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    title: String,
    theme: Theme,
    blocks: Vec<ContentBlock>,
}

impl DocumentBuilder {
    pub fn new(title: impl Into<String>, theme: Theme) -> Self {
        Self {
            title: title.into(),
            theme,
            blocks: Vec::new(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn heading(&mut self, text: impl Into<String>, style: StyleName) -> &mut Self {
        self.push(ContentBlock::Heading {
            text: text.into(),
            style,
        })
    }

    /// Body-styled paragraph.
    pub fn paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.styled(text, StyleName::Body)
    }

    /// Paragraph in any style.
    pub fn styled(&mut self, text: impl Into<String>, style: StyleName) -> &mut Self {
        self.push(ContentBlock::Paragraph {
            text: text.into(),
            style,
        })
    }

    /// One bullet-styled paragraph per item, each prefixed with "• ".
    pub fn bullets<I, S>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in items {
            self.styled(format!("\u{2022} {}", item.as_ref()), StyleName::Bullet);
        }
        self
    }

    pub fn preformatted(&mut self, text: impl Into<String>, style: StyleName) -> &mut Self {
        self.push(ContentBlock::Preformatted {
            text: text.into(),
            style,
        })
    }

    pub fn table(&mut self, data: TableData, rules: TableRules) -> &mut Self {
        self.push(ContentBlock::Table { data, rules })
    }

    pub fn spacer(&mut self, height: f32) -> &mut Self {
        self.push(ContentBlock::Spacer { height })
    }

    pub fn page_break(&mut self) -> &mut Self {
        self.push(ContentBlock::PageBreak)
    }

    fn push(&mut self, block: ContentBlock) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Finish the document, checking every style reference.
    pub fn build(&self) -> Result<Document> {
        let doc = Document {
            title: self.title.clone(),
            theme: self.theme.clone(),
            blocks: self.blocks.clone(),
        };
        doc.validate()?;
        log::debug!("assembled {:?}: {} blocks", doc.title, doc.blocks.len());
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Palette;

    fn theme() -> Theme {
        Theme::build(&Palette::executive())
    }

    #[test]
    fn ragged_rows_are_padded() {
        let data = TableData::new(vec![vec!["a", "b", "c"], vec!["1"], vec!["x", "y"]]);
        assert_eq!(data.row_count(), 3);
        assert_eq!(data.column_count(), 3);
        assert!(data.rows().iter().all(|r| r.len() == 3));
        assert_eq!(data.rows()[1], vec!["1", "", ""]);
        assert!(data.is_header(0));
        assert!(!data.is_header(1));
    }

    #[test]
    fn blocks_keep_insertion_order() {
        let mut b = DocumentBuilder::new("t", theme());
        b.heading("One", StyleName::SectionHeading)
            .paragraph("two")
            .spacer(6.0)
            .page_break()
            .bullets(["three"]);
        let doc = b.build().unwrap();
        assert_eq!(doc.blocks.len(), 5);
        assert!(matches!(&doc.blocks[0], ContentBlock::Heading { text, .. } if text == "One"));
        assert!(matches!(
            &doc.blocks[4],
            ContentBlock::Paragraph { text, style: StyleName::Bullet } if text == "\u{2022} three"
        ));
        assert_eq!(doc.page_breaks(), 1);
    }

    #[test]
    fn undefined_style_fails_build() {
        let mut t = theme();
        t.remove(StyleName::Footer);
        let mut b = DocumentBuilder::new("t", t);
        b.paragraph("ok").styled("footer", StyleName::Footer);
        match b.build() {
            Err(Error::MissingStyle { style, block }) => {
                assert_eq!(style, StyleName::Footer);
                assert_eq!(block, 1);
            }
            other => panic!("expected missing style, got {other:?}"),
        }
    }

    #[test]
    fn rules_resolve_widths_and_alignment() {
        let rules = TableRules::from_theme(&theme(), &[100.0])
            .align_column(2, TextAlign::Center);
        assert_eq!(rules.resolve_widths(3, 300.0), vec![100.0, 100.0, 100.0]);
        assert_eq!(rules.alignment(0), TextAlign::Left);
        assert_eq!(rules.alignment(2), TextAlign::Center);
        assert_eq!(rules.row_background(1), Some(Color::WHITE));
    }
}
