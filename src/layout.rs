//! Layout engine for the markup pipeline – uses Taffy to compute flexbox
//! layout from a styled DOM tree, then converts the result into a tree of
//! positioned boxes in document coordinates.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::dom::Tag;
use crate::error::{Error, Result};
use crate::fonts::FontManager;
use crate::geometry::PageGeometry;
use crate::inline::{self, Run, RunStyle};
use crate::layout_config::TextLine;
use crate::style::{self, ComputedStyle, FontStyle as CssFontStyle, FontWeight, StyledNode};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    /// Lines already broken and aligned within the box width.
    Text {
        lines: Vec<TextLine>,
    },
    Image {
        src: String,
    },
    /// List item marker
    ListItem {
        marker: String,
    },
}

fn taffy_err(e: taffy::TaffyError) -> Error {
    Error::Render(format!("layout: {e}"))
}

fn run_style(s: &ComputedStyle) -> RunStyle {
    RunStyle::new(&s.font_family, s.font_size)
        .bold(s.font_weight == FontWeight::Bold)
        .italic(s.font_style == CssFontStyle::Italic)
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    /// Flatten an inline subtree into styled runs.
    fn collect_runs(node: &StyledNode, out: &mut Vec<Run>) {
        match node {
            StyledNode::Text { text, style } => out.push(Run::Text {
                text: text.clone(),
                style: run_style(style),
            }),
            StyledNode::Element { tag: Tag::Br, .. } => out.push(Run::Break),
            StyledNode::Element { children, .. } => {
                for child in children {
                    Self::collect_runs(child, out);
                }
            }
        }
    }

    /// Return true when every child is a text node or a display:inline element
    /// (no block-level children).
    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => {
                matches!(
                    style.display,
                    style::Display::Inline | style::Display::InlineBlock
                ) && Self::all_inline(gc)
            }
        })
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> Result<NodeId> {
        match styled {
            StyledNode::Text { text, style } => {
                let runs = vec![Run::Text {
                    text: text.clone(),
                    style: run_style(style),
                }];
                self.build_text_leaf(&runs, style, parent_width)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// A leaf holding wrapped, aligned lines that span `width`.
    fn build_text_leaf(
        &mut self,
        runs: &[Run],
        style: &ComputedStyle,
        width: f32,
    ) -> Result<NodeId> {
        let leading = self.fonts.line_height_px(style.font_size, style.line_height);
        let broken = inline::break_lines(runs, width, self.fonts);
        let lines = inline::place(&broken, style.text_align, width, leading);
        self.text_leaf(lines, style, width, leading)
    }

    fn build_preformatted_leaf(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        width: f32,
    ) -> Result<NodeId> {
        let leading = self.fonts.line_height_px(style.font_size, style.line_height);
        let lines = inline::preformatted(text, &run_style(style), leading);
        self.text_leaf(lines, style, width, leading)
    }

    fn text_leaf(
        &mut self,
        lines: Vec<TextLine>,
        style: &ComputedStyle,
        width: f32,
        leading: f32,
    ) -> Result<NodeId> {
        let taffy_style = Style {
            size: Size {
                width: Dimension::Length(width),
                height: Dimension::Length(lines.len() as f32 * leading),
            },
            flex_shrink: 0.0,
            ..Default::default()
        };
        let node = self.taffy.new_leaf(taffy_style).map_err(taffy_err)?;
        // Text leaves keep typography only; the box model belongs to the parent.
        let text_style = ComputedStyle {
            font_size: style.font_size,
            font_weight: style.font_weight,
            font_family: style.font_family.clone(),
            font_style: style.font_style,
            color: style.color,
            text_align: style.text_align,
            line_height: style.line_height,
            text_decoration: style.text_decoration,
            ..ComputedStyle::default()
        };
        self.node_styles.insert(node, text_style);
        self.node_content.insert(node, BoxContent::Text { lines });
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> Result<NodeId> {
        // Border-box width of this element and the width left for content.
        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width - style.margin_left - style.margin_right,
        };
        let inner_width = (my_width
            - style.padding_left
            - style.padding_right
            - 2.0 * style.border_width)
            .max(1.0);

        let mut child_nodes = Vec::new();

        if *tag == Tag::Pre {
            // Preformatted text keeps its lines verbatim.
            let raw: String = children
                .iter()
                .map(|c| {
                    let mut runs = Vec::new();
                    Self::collect_runs(c, &mut runs);
                    runs.iter()
                        .map(|r| match r {
                            Run::Text { text, .. } => text.as_str(),
                            Run::Break => "\n",
                        })
                        .collect::<String>()
                })
                .collect();
            let raw = raw.strip_prefix('\n').unwrap_or(&raw);
            child_nodes.push(self.build_preformatted_leaf(raw, style, inner_width)?);
        } else if tag.is_paragraph() && !children.is_empty() && Self::all_inline(children) {
            // Paragraph-like block elements whose children are all inline get
            // their runs flowed into one text leaf so emphasis wraps with it.
            let mut runs = Vec::new();
            for child in children {
                Self::collect_runs(child, &mut runs);
            }
            let has_text = runs.iter().any(|r| match r {
                Run::Text { text, .. } => !text.trim().is_empty(),
                Run::Break => false,
            });
            if has_text {
                child_nodes.push(self.build_text_leaf(&runs, style, inner_width)?);
            }
        } else {
            let child_widths = self.child_widths(tag, style, children, inner_width);
            let mut list_counter = 0u32;

            for (child, child_width) in children.iter().zip(child_widths) {
                // Whitespace between block elements carries no content.
                if matches!(child, StyledNode::Text { text, .. } if text.trim().is_empty()) {
                    continue;
                }

                // For list items, compute and record the marker string so it can
                // be rendered as a bullet / number in the left gutter.
                let li_marker = match child {
                    StyledNode::Element { tag: Tag::Li, .. } => {
                        list_counter += 1;
                        Some(if *tag == Tag::Ol {
                            format!("{}. ", list_counter)
                        } else {
                            "\u{2022} ".to_string()
                        })
                    }
                    _ => None,
                };

                let child_id = self.build_node(child, child_width)?;

                if let Some(marker) = li_marker {
                    self.node_content
                        .insert(child_id, BoxContent::ListItem { marker });
                }
                child_nodes.push(child_id);
            }
        }

        // For <img> elements, resolve Auto width/height to concrete dimensions
        // using the image's intrinsic size decoded from the base64 data URI.
        // Without this, a flex container with no children and Auto dimensions
        // computes to 0×0, making the image invisible in the rendered PDF.
        let style_override: Option<ComputedStyle> = if *tag == Tag::Img
            && (matches!(style.width, style::Dimension::Auto)
                || matches!(style.height, style::Dimension::Auto))
        {
            let src = attrs.get("src").map(|s| s.as_str()).unwrap_or("");
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let taffy_style = self.computed_to_taffy(effective_style, tag);
        let node = self
            .taffy
            .new_with_children(taffy_style, &child_nodes)
            .map_err(taffy_err)?;
        self.node_styles.insert(node, effective_style.clone());

        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        Ok(node)
    }

    /// Width each child is built against. Table rows honour explicit cell
    /// widths and share the remainder equally; flex rows split evenly.
    fn child_widths(
        &self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        inner_width: f32,
    ) -> Vec<f32> {
        let is_flex_row =
            style.display == style::Display::Flex && style.flex_direction == style::FlexDirection::Row;
        if !(is_flex_row || *tag == Tag::Tr) {
            return vec![inner_width; children.len()];
        }

        let elements: Vec<&ComputedStyle> = children
            .iter()
            .filter_map(|c| match c {
                StyledNode::Element { style, .. } => Some(style),
                StyledNode::Text { .. } => None,
            })
            .collect();
        let count = elements.len().max(1);
        let gap_total = style.gap * count.saturating_sub(1) as f32;
        let available = (inner_width - gap_total).max(1.0);

        let fixed = |s: &ComputedStyle| match s.width {
            style::Dimension::Px(w) if *tag == Tag::Tr => Some(w),
            style::Dimension::Percent(p) if *tag == Tag::Tr => Some(available * p / 100.0),
            _ => None,
        };
        let fixed_total: f32 = elements.iter().filter_map(|s| fixed(s)).sum();
        let auto_count = elements.iter().filter(|s| fixed(s).is_none()).count();
        let share = if auto_count > 0 {
            ((available - fixed_total) / auto_count as f32).max(1.0)
        } else {
            1.0
        };

        children
            .iter()
            .map(|c| match c {
                StyledNode::Element { style, .. } => fixed(style).unwrap_or(share),
                StyledNode::Text { .. } => share,
            })
            .collect()
    }

    fn computed_to_taffy(&self, s: &ComputedStyle, tag: &Tag) -> Style {
        let mut ts = Style::default();

        let margin = Rect {
            top: LengthPercentageAuto::Length(s.margin_top),
            right: LengthPercentageAuto::Length(s.margin_right),
            bottom: LengthPercentageAuto::Length(s.margin_bottom),
            left: LengthPercentageAuto::Length(s.margin_left),
        };
        let padding = Rect {
            top: LengthPercentage::Length(s.padding_top),
            right: LengthPercentage::Length(s.padding_right),
            bottom: LengthPercentage::Length(s.padding_bottom),
            left: LengthPercentage::Length(s.padding_left),
        };
        let border = Rect {
            top: LengthPercentage::Length(s.border_width),
            right: LengthPercentage::Length(s.border_width),
            bottom: LengthPercentage::Length(s.border_width),
            left: LengthPercentage::Length(s.border_width),
        };

        // -----------------------------------------------------------------
        // HTML table model: always use flex regardless of computed display.
        // -----------------------------------------------------------------
        match tag {
            Tag::Table => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.size.width = self.dim_to_taffy(s.width);
                ts.size.height = self.dim_to_taffy(s.height);
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.padding = padding;
                ts.margin = margin;
                ts.border = border;
                return ts;
            }
            Tag::Tr => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.align_items = Some(taffy::AlignItems::Stretch);
                ts.size.width = taffy::Dimension::Percent(1.0);
                ts.min_size.width = taffy::Dimension::Length(0.0);
                ts.margin = margin;
                return ts;
            }
            Tag::Td | Tag::Th => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.min_size.width = taffy::Dimension::Length(0.0);
                match s.width {
                    style::Dimension::Px(w) => {
                        ts.flex_grow = 0.0;
                        ts.flex_shrink = 1.0;
                        ts.flex_basis = taffy::Dimension::Length(w);
                    }
                    style::Dimension::Percent(p) => {
                        ts.flex_grow = 0.0;
                        ts.flex_shrink = 1.0;
                        ts.flex_basis = taffy::Dimension::Percent(p / 100.0);
                    }
                    style::Dimension::Auto => {
                        ts.flex_grow = 1.0;
                        ts.flex_shrink = 1.0;
                        ts.flex_basis = taffy::Dimension::Length(0.0); // equal columns
                    }
                }
                ts.padding = padding;
                ts.border = border;
                return ts;
            }
            _ => {}
        }

        // Display / layout mode
        match s.display {
            style::Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => taffy::FlexDirection::Row,
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                    style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                    style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            style::Display::Block
            | style::Display::ListItem
            | style::Display::Table
            | style::Display::TableRow
            | style::Display::TableCell
            | style::Display::InlineBlock => {
                // Use flex column for block-level elements (vertical stacking)
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            style::Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.flex_wrap = taffy::FlexWrap::Wrap;
            }
            style::Display::None => {
                ts.display = taffy::Display::None;
            }
        }

        // Sizing
        ts.size = Size {
            width: self.dim_to_taffy(s.width),
            height: self.dim_to_taffy(s.height),
        };
        // Allow flex/shrink items to compress below their natural content size
        ts.min_size = Size {
            width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
                taffy::Dimension::Length(0.0)
            } else {
                self.dim_to_taffy(s.min_width)
            },
            height: taffy::Dimension::Auto,
        };
        ts.max_size = Size {
            width: self.dim_to_taffy(s.max_width),
            height: taffy::Dimension::Auto,
        };

        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;
        ts.margin = margin;
        ts.padding = padding;
        ts.border = border;
        ts.gap = Size {
            width: LengthPercentage::Length(s.gap),
            height: LengthPercentage::Length(s.gap),
        };

        ts
    }

    fn dim_to_taffy(&self, d: style::Dimension) -> taffy::Dimension {
        match d {
            style::Dimension::Auto => taffy::Dimension::Auto,
            style::Dimension::Px(v) => taffy::Dimension::Length(v),
            style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
        }
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox> {
        let layout = self.taffy.layout(node).map_err(taffy_err)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .unwrap_or_default()
            .iter()
            .map(|&child| self.extract(child, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            page_break_inside_avoid: style.page_break_inside_avoid,
            style,
            content,
            children,
        })
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Attempt to decode a base64 data-URI image and return a cloned
/// [`ComputedStyle`] with any `Auto` width/height replaced by concrete point
/// values derived from the image's intrinsic dimensions.
///
/// Returns `None` when the src is not a parseable base64 data URI, when image
/// decoding fails, or when both dimensions are already specified.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

    if !src.starts_with("data:") || !src.contains(";base64,") {
        return None;
    }
    let comma = src.find(',')?;
    let bytes = BASE64_STD.decode(src[comma + 1..].trim()).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        // Both Auto: one pixel per point.
        (None, None) => {
            s.width = style::Dimension::Px(px_w);
            s.height = style::Dimension::Px(px_h);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree inside the geometry's content width,
/// returning the top-level positioned boxes in document coordinates. The x
/// coordinates already include the left margin; y starts at zero.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    geometry: &PageGeometry,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>> {
    let content_width = geometry.content_width();
    let mut builder = LayoutBuilder::new(fonts);

    let mut child_ids = Vec::new();
    for node in styled_nodes {
        if matches!(node, StyledNode::Text { text, .. } if text.trim().is_empty()) {
            continue;
        }
        child_ids.push(builder.build_node(node, content_width)?);
    }

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: taffy::Dimension::Length(content_width),
            height: taffy::Dimension::Auto,
        },
        ..Default::default()
    };

    let root = builder
        .taffy
        .new_with_children(root_style, &child_ids)
        .map_err(taffy_err)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(taffy_err)?;

    let root_box = builder.extract(root, geometry.margin_left, 0.0)?;
    log::debug!("laid out {} top-level boxes", root_box.children.len());
    Ok(root_box.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;

    fn layout(html: &str) -> Vec<PositionedBox> {
        let styled = build_styled_tree(&parse_html(html), None);
        compute_layout(&styled, &PageGeometry::default(), &FontManager::default()).unwrap()
    }

    fn first_text(b: &PositionedBox) -> Option<&Vec<TextLine>> {
        if let BoxContent::Text { lines } = &b.content {
            return Some(lines);
        }
        b.children.iter().find_map(first_text)
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>");
        assert!(!boxes.is_empty(), "Should produce at least one box");
        let first = &boxes[0];
        assert!(first.width > 0.0, "Box should have width");
        assert!(first.height > 0.0, "Box should have height");
        assert!((first.x - 40.0).abs() < 0.01, "starts at the left margin");
    }

    #[test]
    fn emphasis_flows_inside_one_paragraph() {
        let boxes = layout(r#"<p><b>Problem:</b> Compliance teams <i>re-read</i> regulations.</p>"#);
        let lines = first_text(&boxes[0]).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Problem: Compliance teams re-read regulations.");
        assert!(lines[0].spans[0].bold);
        assert!(lines[0].spans.iter().any(|s| s.italic));
    }

    #[test]
    fn padding_insets_text() {
        let boxes = layout(r#"<p style="padding: 8pt; background-color: #e8f4f8">Callout</p>"#);
        let para = &boxes[0];
        let leaf = &para.children[0];
        assert!((leaf.x - para.x - 8.0).abs() < 0.01);
        assert!((leaf.y - para.y - 8.0).abs() < 0.01);
    }

    #[test]
    fn table_cells_honour_widths() {
        let boxes = layout(
            r#"<table><tr><td style="width: 100pt">a</td><td style="width: 200pt">b</td></tr></table>"#,
        );
        let row = &boxes[0].children[0];
        assert_eq!(row.children.len(), 2);
        assert!((row.children[0].width - 100.0).abs() < 0.5);
        assert!((row.children[1].width - 200.0).abs() < 0.5);
    }

    #[test]
    fn preformatted_lines_are_kept() {
        let boxes = layout("<pre>emir/\n  package.yaml\n  docs/</pre>");
        let lines = first_text(&boxes[0]).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].text, "  package.yaml");
    }

    #[test]
    fn layout_flex_row() {
        let boxes = layout(
            r#"<div style="display: flex"><div style="flex: 1">A</div><div style="flex: 1">B</div></div>"#,
        );
        let row = &boxes[0];
        assert_eq!(row.children.len(), 2);
        assert!(row.children[1].x > row.children[0].x);
    }
}
