//! Pagination for the markup pipeline – splits positioned boxes into pages.
//!
//! Handles:
//! - Page boundaries from the content frame of a [`PageGeometry`]
//! - Page-break-before / page-break-after hints
//! - Table row splitting across pages

use crate::fonts::FontManager;
use crate::geometry::PageGeometry;
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::style;

/// Recursively expand any pure-container box whose height exceeds a single
/// page so its children can be split across pages individually.
fn flatten_for_pagination<'a>(
    boxes: &'a [PositionedBox],
    content_height: f32,
) -> Vec<&'a PositionedBox> {
    let mut result = Vec::new();
    for pbox in boxes {
        if pbox.height > content_height
            && matches!(pbox.content, BoxContent::None)
            && !pbox.children.is_empty()
        {
            result.extend(flatten_for_pagination(&pbox.children, content_height));
        } else {
            result.push(pbox);
        }
    }
    result
}

/// Convert positioned boxes into a paginated LayoutConfig.
pub fn paginate(
    boxes: &[PositionedBox],
    geometry: &PageGeometry,
    fonts: &FontManager,
) -> LayoutConfig {
    let mut config = LayoutConfig::for_geometry(geometry);
    let content_height = geometry.content_height();
    let margin_top = geometry.margin_top;

    // Expand oversized wrapper divs so their children can paginate individually.
    let flat = flatten_for_pagination(boxes, content_height);

    let mut current_page = PageLayout {
        page_index: 0,
        boxes: Vec::new(),
    };

    // Document-space y at which the current page begins.  All PositionedBox.y
    // values are absolute document coordinates produced by the layout extractor,
    // so `pbox.y - page_start_doc_y` gives the y-on-page for any box.
    let mut page_start_doc_y = 0.0f32;

    for pbox in &flat {
        // Page break before
        if pbox.page_break_before && !current_page.boxes.is_empty() {
            config.pages.push(current_page);
            current_page = PageLayout {
                page_index: config.pages.len(),
                boxes: Vec::new(),
            };
            page_start_doc_y = pbox.y;
        }

        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        let box_bottom = y_on_page + pbox.height;

        // Does this box overflow the current page?
        if box_bottom > content_height && !current_page.boxes.is_empty() {
            if is_table_like(pbox) && !pbox.page_break_inside_avoid {
                split_table_box(
                    pbox,
                    &mut config,
                    &mut current_page,
                    &mut page_start_doc_y,
                    content_height,
                    margin_top,
                    fonts,
                );
                continue;
            } else {
                config.pages.push(current_page);
                current_page = PageLayout {
                    page_index: config.pages.len(),
                    boxes: Vec::new(),
                };
                page_start_doc_y = pbox.y;
            }
        }

        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        let layout_box = positioned_to_layout_box(pbox, margin_top, y_on_page, fonts);
        current_page.boxes.push(layout_box);

        // Page break after
        if pbox.page_break_after {
            config.pages.push(current_page);
            current_page = PageLayout {
                page_index: config.pages.len(),
                boxes: Vec::new(),
            };
            page_start_doc_y = pbox.y + pbox.height;
        }
    }

    if !current_page.boxes.is_empty() {
        config.pages.push(current_page);
    }
    if config.pages.is_empty() {
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        });
    }
    log::debug!("paginated {} boxes into {} pages", flat.len(), config.pages.len());
    config
}

fn is_table_like(pbox: &PositionedBox) -> bool {
    pbox.style.display == style::Display::Table && !pbox.children.is_empty()
}

fn split_table_box(
    pbox: &PositionedBox,
    config: &mut LayoutConfig,
    current_page: &mut PageLayout,
    page_start_doc_y: &mut f32,
    content_height: f32,
    margin_top: f32,
    fonts: &FontManager,
) {
    for child in &pbox.children {
        let y_on_page = (child.y - *page_start_doc_y).max(0.0);
        if y_on_page + child.height > content_height && !current_page.boxes.is_empty() {
            config.pages.push(std::mem::replace(
                current_page,
                PageLayout {
                    page_index: config.pages.len(),
                    boxes: Vec::new(),
                },
            ));
            *page_start_doc_y = child.y;
        }
        let y = (child.y - *page_start_doc_y).max(0.0);
        let row_box = positioned_to_layout_box(child, margin_top, y, fonts);
        current_page.boxes.push(row_box);
    }
}

/// Convert a PositionedBox to a LayoutBox with page-absolute coordinates.
/// `y_on_page` = `pbox.y - page_start_doc_y`; Taffy's layout already encodes
/// element margins into `pbox.y`, so only the page's top margin is added.
fn positioned_to_layout_box(
    pbox: &PositionedBox,
    margin_top: f32,
    y_on_page: f32,
    fonts: &FontManager,
) -> LayoutBox {
    let abs_x = pbox.x;
    let abs_y = margin_top + y_on_page;
    build_layout_box(pbox, abs_x, abs_y, fonts)
}

/// Recursively build a LayoutBox tree where every box carries *page-absolute*
/// x/y coordinates (origin = top-left of the physical page).
///
/// For each child, its absolute y is derived by:
///   `child_abs_y = parent_abs_y + (child.y − parent.y)`
/// because PositionedBox.y values are accumulated document-space absolutes
/// (set by `extract` starting with `offset_y = 0`), so the difference gives
/// the child's position relative to its parent.
fn build_layout_box(
    pbox: &PositionedBox,
    abs_x: f32,
    abs_y: f32,
    fonts: &FontManager,
) -> LayoutBox {
    let mut lb = LayoutBox::new(abs_x, abs_y, pbox.width, pbox.height);

    // Background
    if !pbox.style.background_color.is_transparent() {
        let c = &pbox.style.background_color;
        lb.background_color = Some([c.r, c.g, c.b, c.a]);
    }

    // Border
    if pbox.style.border_width > 0.0 {
        let c = &pbox.style.border_color;
        lb.border = Some(BorderStyle {
            width: pbox.style.border_width,
            color: [c.r, c.g, c.b, c.a],
        });
    }

    // Content
    match &pbox.content {
        BoxContent::Text { lines } => {
            let c = &pbox.style.color;
            let line_height = fonts.line_height_px(pbox.style.font_size, pbox.style.line_height);
            lb.text = Some(TextContent {
                lines: lines.clone(),
                font_family: pbox.style.font_family.clone(),
                font_size: pbox.style.font_size,
                bold: pbox.style.font_weight == style::FontWeight::Bold,
                italic: pbox.style.font_style == style::FontStyle::Italic,
                color: [c.r, c.g, c.b, c.a],
                line_height,
                text_align: pbox.style.text_align.as_css().to_string(),
                underline: pbox.style.text_decoration == style::TextDecoration::Underline,
                list_marker: None,
            });
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::ListItem { marker } => {
            let c = &pbox.style.color;
            let line_height = fonts.line_height_px(pbox.style.font_size, pbox.style.line_height);
            // `lines` is empty – the bullet / number is rendered via
            // `list_marker` (drawn 16 pt to the left of the li box), while
            // the li's actual text content comes from its child boxes.
            lb.text = Some(TextContent {
                lines: vec![],
                font_family: pbox.style.font_family.clone(),
                font_size: pbox.style.font_size,
                bold: pbox.style.font_weight == style::FontWeight::Bold,
                italic: false,
                color: [c.r, c.g, c.b, c.a],
                line_height,
                text_align: "left".to_string(),
                underline: false,
                list_marker: Some(marker.clone()),
            });
        }
        BoxContent::None => {}
    }

    // Recurse into children, propagating absolute coordinates.
    // Each child's PositionedBox.y is a document-space absolute, so
    // (child.y − pbox.y) gives the child's offset within the parent.
    for child in &pbox.children {
        let child_abs_x = child.x; // already page-absolute (extract started at the left margin)
        let child_abs_y = abs_y + (child.y - pbox.y);
        let child_box = build_layout_box(child, child_abs_x, child_abs_y, fonts);
        lb.children.push(child_box);
    }

    lb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::layout::compute_layout;
    use crate::style::build_styled_tree;

    fn paginate_html(html: &str) -> LayoutConfig {
        let geometry = PageGeometry::default();
        let fonts = FontManager::default();
        let styled = build_styled_tree(&parse_html(html), None);
        let boxes = compute_layout(&styled, &geometry, &fonts).unwrap();
        paginate(&boxes, &geometry, &fonts)
    }

    #[test]
    fn single_page() {
        let config = paginate_html("<p>Short text</p>");
        assert_eq!(config.pages.len(), 1);
        let first = &config.pages[0].boxes[0];
        assert!((first.y - 40.0).abs() < 0.01, "top margin applied");
    }

    #[test]
    fn multiple_pages() {
        let mut html = String::new();
        for i in 0..60 {
            html.push_str(&format!("<p>Paragraph {} with some text</p>", i));
        }
        let config = paginate_html(&html);
        assert!(
            config.pages.len() > 1,
            "Expected multiple pages, got {}",
            config.pages.len()
        );
        for page in &config.pages {
            for b in &page.boxes {
                assert!(b.y + b.height <= 842.0 - 40.0 + 0.5);
            }
        }
    }

    #[test]
    fn break_after_starts_new_page() {
        let config = paginate_html(
            r#"<div style="page-break-after: always"><p>one</p></div><div><p>two</p></div>"#,
        );
        assert_eq!(config.pages.len(), 2);
        assert_eq!(config.page_text(1), "two");
    }

    #[test]
    fn long_table_splits_by_row() {
        let mut html = String::from("<table>");
        for i in 0..80 {
            html.push_str(&format!("<tr><td>row {i}</td><td>value</td></tr>"));
        }
        html.push_str("</table>");
        let config = paginate_html(&format!("<p>lead</p>{html}"));
        assert!(config.pages.len() >= 2);
        assert!(config.page_text(1).starts_with("row "));
    }
}
