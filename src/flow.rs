//! Direct layout engine – flows content blocks down the content frame of
//! each page and paginates as it goes.
//!
//! Rules, in block order:
//! - space between blocks is the previous block's space-after plus the next
//!   block's space-before; both are dropped at the top of a page
//! - a spacer at the top of a page collapses, elsewhere it is clamped to the
//!   frame bottom
//! - a page break always starts a new page
//! - text that does not fit moves to the next page, or splits by line when
//!   it already starts a page or is taller than the frame
//! - tables are placed whole, moved to a fresh page, or split at row
//!   boundaries with the header repeated
//!
//! Background and border padding are drawn outside a block's flow height.

use crate::content::{ContentBlock, Document, TableData, TableRules, VAlign};
use crate::error::Result;
use crate::fonts::FontManager;
use crate::geometry::PageGeometry;
use crate::inline::{self, Run, RunStyle};
use crate::layout_config::{BorderStyle, LayoutBox, LayoutConfig, PageLayout, TextContent, TextLine};
use crate::style::Color;
use crate::theme::{BlockStyle, StyleName, Theme};

const EPS: f32 = 0.01;

/// Lay out a whole document.
pub fn layout_document(doc: &Document, geometry: &PageGeometry) -> Result<LayoutConfig> {
    doc.validate()?;
    let mut flow = Flow::new(geometry, &doc.title);
    for block in &doc.blocks {
        flow.block(block, &doc.theme)?;
    }
    let config = flow.finish();
    log::info!(
        "laid out {} blocks on {} pages",
        doc.blocks.len(),
        config.pages.len()
    );
    Ok(config)
}

struct Flow<'a> {
    geometry: &'a PageGeometry,
    fonts: FontManager,
    config: LayoutConfig,
    page: Vec<LayoutBox>,
    /// Page-absolute y of the next free line.
    y: f32,
    /// Space-after owed by the previous block.
    pending: f32,
}

struct CellLayout {
    lines: Vec<TextLine>,
    height: f32,
}

struct RowLayout {
    index: usize,
    cells: Vec<CellLayout>,
    height: f32,
}

impl<'a> Flow<'a> {
    fn new(geometry: &'a PageGeometry, title: &str) -> Self {
        let mut config = LayoutConfig::for_geometry(geometry);
        config.title = title.to_string();
        Self {
            geometry,
            fonts: FontManager::default(),
            config,
            page: Vec::new(),
            y: geometry.margin_top,
            pending: 0.0,
        }
    }

    fn bottom(&self) -> f32 {
        self.geometry.frame_bottom()
    }

    fn at_top(&self) -> bool {
        self.y <= self.geometry.margin_top + EPS
    }

    fn gap(&self, space_before: f32) -> f32 {
        if self.at_top() {
            0.0
        } else {
            self.pending + space_before
        }
    }

    fn new_page(&mut self) {
        let boxes = std::mem::take(&mut self.page);
        self.config.pages.push(PageLayout {
            page_index: self.config.pages.len(),
            boxes,
        });
        self.y = self.geometry.margin_top;
        self.pending = 0.0;
    }

    fn finish(mut self) -> LayoutConfig {
        self.new_page();
        self.config
    }

    fn block(&mut self, block: &ContentBlock, theme: &Theme) -> Result<()> {
        match block {
            ContentBlock::Heading { text, style } | ContentBlock::Paragraph { text, style } => {
                let style = theme.style(*style)?;
                let width = self.geometry.content_width() - style.left_indent;
                let runs = inline::parse_markup(text, &run_style(style));
                let broken = inline::break_lines(&runs, width, &self.fonts);
                let lines = inline::place(&broken, style.alignment, width, style.leading);
                self.text(lines, style);
            }
            ContentBlock::Preformatted { text, style } => {
                let style = theme.style(*style)?;
                let lines = inline::preformatted(text, &run_style(style), style.leading);
                self.text(lines, style);
            }
            ContentBlock::Table { data, rules } => {
                let header = theme.style(StyleName::TableHeader)?;
                let cell = theme.style(StyleName::TableCell)?;
                self.table(data, rules, header, cell);
            }
            ContentBlock::Spacer { height } => self.spacer(*height),
            ContentBlock::PageBreak => self.new_page(),
        }
        Ok(())
    }

    fn spacer(&mut self, height: f32) {
        if self.at_top() {
            return;
        }
        self.y = (self.y + self.pending + height).min(self.bottom());
        self.pending = 0.0;
    }

    fn text(&mut self, mut lines: Vec<TextLine>, style: &BlockStyle) {
        if lines.is_empty() {
            return;
        }
        let leading = style.leading;
        let total = lines.len() as f32 * leading;
        let frame = self.geometry.content_height();
        if self.y + self.gap(style.space_before) + total > self.bottom() + EPS
            && !self.at_top()
            && total <= frame + EPS
        {
            self.new_page();
        }

        loop {
            let gap = self.gap(style.space_before);
            let avail = self.bottom() - (self.y + gap);
            let mut fit = ((avail + EPS) / leading).floor().max(0.0) as usize;
            if fit == 0 {
                if !self.at_top() {
                    self.new_page();
                    continue;
                }
                fit = 1;
            }
            let rest = lines.split_off(fit.min(lines.len()));
            self.y += gap;
            self.emit_text(lines, style);
            lines = rest;
            if lines.is_empty() {
                break;
            }
            log::debug!("split text block, {} lines carried over", lines.len());
            self.new_page();
        }
        self.pending = style.space_after;
    }

    fn emit_text(&mut self, mut lines: Vec<TextLine>, style: &BlockStyle) {
        for (i, line) in lines.iter_mut().enumerate() {
            line.y_offset = i as f32 * style.leading;
        }
        let height = lines.len() as f32 * style.leading;
        let x = self.geometry.margin_left + style.left_indent;
        let width = self.geometry.content_width() - style.left_indent;
        let mut text_box = LayoutBox::new(x, self.y, width, height);
        text_box.text = Some(text_content(lines, style, style.color));
        self.page.push(decorate(text_box, style));
        self.y += height;
    }

    fn table(&mut self, data: &TableData, rules: &TableRules, header: &BlockStyle, cell: &BlockStyle) {
        if data.row_count() == 0 {
            return;
        }
        let frame_width = self.geometry.content_width();
        let widths = rules.resolve_widths(data.column_count(), frame_width);
        let table_width: f32 = widths.iter().sum();
        let x = self.geometry.margin_left + ((frame_width - table_width) / 2.0).max(0.0);

        let rows: Vec<RowLayout> = data
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let style = if data.is_header(i) { header } else { cell };
                self.layout_row(i, row, &widths, rules, style)
            })
            .collect();
        let total: f32 = rows.iter().map(|r| r.height).sum();

        let gap = self.gap(0.0);
        if self.y + gap + total > self.bottom() + EPS
            && !self.at_top()
            && total <= self.geometry.content_height() + EPS
        {
            self.new_page();
        } else {
            self.y += gap;
        }

        let (head, body) = rows.split_at(1);
        let head = &head[0];
        let mut next = 0;
        loop {
            let need = head.height + body.get(next).map_or(0.0, |r| r.height);
            if self.y + need > self.bottom() + EPS && !self.at_top() {
                self.new_page();
            }
            self.emit_row(head, x, &widths, rules, header);
            let mut placed = 0;
            while let Some(row) = body.get(next) {
                if placed > 0 && self.y + row.height > self.bottom() + EPS {
                    break;
                }
                self.emit_row(row, x, &widths, rules, cell);
                next += 1;
                placed += 1;
            }
            if next >= body.len() {
                break;
            }
            log::debug!("split table, {} rows carried over", body.len() - next);
            self.new_page();
        }
        self.pending = 0.0;
    }

    fn layout_row(
        &self,
        index: usize,
        row: &[String],
        widths: &[f32],
        rules: &TableRules,
        style: &BlockStyle,
    ) -> RowLayout {
        let base = run_style(style);
        let cells: Vec<CellLayout> = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(col, (text, width))| {
                let inner = (width - 2.0 * rules.padding_x).max(0.0);
                let broken = inline::break_lines(&cell_runs(text, &base), inner, &self.fonts);
                let lines = inline::place(&broken, rules.alignment(col), inner, style.leading);
                CellLayout {
                    height: lines.len() as f32 * style.leading,
                    lines,
                }
            })
            .collect();
        let bottom_pad = if index == 0 {
            rules.header_padding_bottom
        } else {
            rules.padding_bottom
        };
        let text_height = cells.iter().map(|c| c.height).fold(0.0, f32::max);
        RowLayout {
            index,
            cells,
            height: text_height + rules.padding_top + bottom_pad,
        }
    }

    fn emit_row(&mut self, row: &RowLayout, x: f32, widths: &[f32], rules: &TableRules, style: &BlockStyle) {
        let is_header = row.index == 0;
        let bottom_pad = if is_header {
            rules.header_padding_bottom
        } else {
            rules.padding_bottom
        };
        let background = if is_header {
            Some(rules.header_background)
        } else {
            rules.row_background(row.index)
        };
        let color = if is_header { rules.header_text } else { style.color };
        let content = row.height - rules.padding_top - bottom_pad;

        let mut cell_x = x;
        for ((col, cell), width) in row.cells.iter().enumerate().zip(widths) {
            let mut cell_box = LayoutBox::new(cell_x, self.y, *width, row.height);
            cell_box.background_color = background.map(rgba);
            if rules.grid_width > 0.0 {
                cell_box.border = Some(BorderStyle {
                    width: rules.grid_width,
                    color: rgba(rules.grid_color),
                });
            }
            let offset = match rules.valign {
                VAlign::Top => 0.0,
                VAlign::Middle => (content - cell.height) / 2.0,
                VAlign::Bottom => content - cell.height,
            };
            let mut text_box = LayoutBox::new(
                cell_x + rules.padding_x,
                self.y + rules.padding_top + offset,
                (width - 2.0 * rules.padding_x).max(0.0),
                cell.height,
            );
            let mut text = text_content(cell.lines.clone(), style, color);
            text.text_align = rules.alignment(col).as_css().to_string();
            text_box.text = Some(text);
            cell_box.children.push(text_box);
            self.page.push(cell_box);
            cell_x += width;
        }
        self.y += row.height;
    }
}

fn rgba(c: Color) -> [f32; 4] {
    [c.r, c.g, c.b, c.a]
}

fn run_style(style: &BlockStyle) -> RunStyle {
    RunStyle::new(&style.font_family, style.font_size)
        .bold(style.bold)
        .italic(style.italic)
}

/// Cell strings are plain text; a newline forces a line break.
fn cell_runs(text: &str, style: &RunStyle) -> Vec<Run> {
    let mut runs = Vec::new();
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            runs.push(Run::Break);
        }
        runs.extend(inline::plain(part, style));
    }
    runs
}

fn text_content(lines: Vec<TextLine>, style: &BlockStyle, color: Color) -> TextContent {
    TextContent {
        lines,
        font_family: style.font_family.clone(),
        font_size: style.font_size,
        bold: style.bold,
        italic: style.italic,
        color: rgba(color),
        line_height: style.leading,
        text_align: style.alignment.as_css().to_string(),
        underline: false,
        list_marker: None,
    }
}

/// Wrap a text box in its background/border box, grown by the padding.
fn decorate(inner: LayoutBox, style: &BlockStyle) -> LayoutBox {
    if style.background.is_none() && style.border.is_none() {
        return inner;
    }
    let pad = style.border_padding;
    let mut outer = LayoutBox::new(
        inner.x - pad,
        inner.y - pad,
        inner.width + 2.0 * pad,
        inner.height + 2.0 * pad,
    );
    outer.background_color = style.background.map(rgba);
    outer.border = style.border.map(|b| BorderStyle {
        width: b.width,
        color: rgba(b.color),
    });
    outer.children.push(inner);
    outer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DocumentBuilder;
    use crate::geometry::CM;
    use crate::theme::Palette;

    fn geometry() -> PageGeometry {
        PageGeometry::a4().uniform(2.0 * CM)
    }

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new("test", Theme::build(&Palette::executive()))
    }

    fn lay_out(b: &DocumentBuilder) -> LayoutConfig {
        layout_document(&b.build().unwrap(), &geometry()).unwrap()
    }

    #[test]
    fn page_breaks_add_pages() {
        let mut b = builder();
        b.paragraph("one").page_break().paragraph("two").page_break().paragraph("three");
        let config = lay_out(&b);
        assert_eq!(config.pages.len(), 3);
        assert_eq!(config.page_text(2), "three");
    }

    #[test]
    fn page_break_on_empty_page_still_counts() {
        let mut b = builder();
        b.page_break().page_break();
        assert_eq!(lay_out(&b).pages.len(), 3);
    }

    #[test]
    fn space_before_is_dropped_at_page_top() {
        let mut b = builder();
        b.heading("First", StyleName::SectionHeading);
        let config = lay_out(&b);
        let heading = &config.pages[0].boxes[0];
        // The rule box sits `border_padding` above the text.
        assert!((heading.y - (2.0 * CM - 3.0)).abs() < 0.01);
        assert!((heading.children[0].y - 2.0 * CM).abs() < 0.01);
    }

    #[test]
    fn spacing_is_after_plus_before() {
        let mut b = builder();
        b.paragraph("a").heading("b", StyleName::SubsectionHeading);
        let config = lay_out(&b);
        let boxes = &config.pages[0].boxes;
        // body: leading 11, space after 4; subheading: space before 6
        assert!((boxes[1].y - (boxes[0].y + 11.0 + 4.0 + 6.0)).abs() < 0.01);
    }

    #[test]
    fn spacer_collapses_at_top_and_never_breaks() {
        let mut b = builder();
        b.spacer(50.0).paragraph("top").spacer(10_000.0);
        let config = lay_out(&b);
        assert_eq!(config.pages.len(), 1);
        assert!((config.pages[0].boxes[0].y - 2.0 * CM).abs() < 0.01);
    }

    #[test]
    fn long_paragraph_splits_by_line() {
        let mut b = builder();
        b.paragraph("word ".repeat(4000));
        let config = lay_out(&b);
        assert!(config.pages.len() > 1);
        let bottom = geometry().frame_bottom();
        for page in &config.pages {
            for lbox in &page.boxes {
                assert!(lbox.y + lbox.height <= bottom + 0.01);
            }
        }
    }

    #[test]
    fn paragraph_that_does_not_fit_moves_whole() {
        let mut b = builder();
        b.paragraph("short line")
            .spacer(705.0)
            .paragraph("two line paragraph ".repeat(12));
        let config = lay_out(&b);
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.pages[1].boxes.len(), 1);
        assert!(config.page_text(1).starts_with("two line"));
    }

    #[test]
    fn oversized_table_repeats_header() {
        let theme = Theme::build(&Palette::executive());
        let mut rows = vec![vec!["Key".to_string(), "Value".to_string()]];
        for i in 0..120 {
            rows.push(vec![format!("row {i}"), "value".to_string()]);
        }
        let rules = TableRules::from_theme(&theme, &[100.0, 200.0]);
        let mut b = DocumentBuilder::new("t", theme);
        b.table(TableData::new(rows), rules);
        let config = lay_out(&b);
        assert!(config.pages.len() >= 2);
        for page in 0..config.pages.len() {
            assert!(config.page_text(page).starts_with("Key\nValue"), "page {page}");
        }
        let all: String = (0..config.pages.len())
            .map(|p| config.page_text(p))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(all.matches("row ").count(), 120);
    }

    #[test]
    fn table_is_centred_with_zebra_rows() {
        let theme = Theme::build(&Palette::executive());
        let rules = TableRules::from_theme(&theme, &[100.0, 100.0]);
        let mut b = DocumentBuilder::new("t", theme);
        b.table(TableData::new([["h1", "h2"], ["a", "b"], ["c", "d"]]), rules.clone());
        let config = lay_out(&b);
        let cells = &config.pages[0].boxes;
        assert_eq!(cells.len(), 6);
        let expected_x = 2.0 * CM + (geometry().content_width() - 200.0) / 2.0;
        assert!((cells[0].x - expected_x).abs() < 0.01);
        assert_eq!(cells[0].background_color, Some(rgba(rules.header_background)));
        assert_eq!(cells[2].background_color, Some(rgba(Color::WHITE)));
        assert_ne!(cells[4].background_color, cells[2].background_color);
    }
}
