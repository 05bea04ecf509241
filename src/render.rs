//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API). Text is set in the builtin Helvetica and
//! Courier faces, so no font files are embedded.

use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::{Error, Result};
use crate::fonts::{Family, FontManager};
use crate::layout_config::*;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a LayoutConfig into PDF bytes.
///
/// `<img>` elements whose `src` is not a base64 data URI, or whose bytes
/// cannot be decoded, are skipped with a `log::warn`.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>> {
    if !(config.page_width_pt > 0.0 && config.page_height_pt > 0.0) {
        return Err(Error::Render(format!(
            "invalid page size {}x{} pt",
            config.page_width_pt, config.page_height_pt
        )));
    }
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in &all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image: decode error: {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());
        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image: PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);
        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let fonts = FontManager::default();
    let mut pages = Vec::new();
    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, config.page_height_pt, &image_resources, &fonts);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    let page_count = pages.len();
    doc.with_pages(pages);
    let bytes = doc.save(
        &PdfSaveOptions {
            // Keep the raw `Tj` operators written by `write_text`.
            secure: false,
            ..PdfSaveOptions::default()
        },
        &mut Vec::new(),
    );
    log::debug!("rendered {page_count} pages, {} bytes", bytes.len());
    Ok(bytes)
}

/// Pick the builtin face for a family and emphasis.
fn builtin_font(family: &str, bold: bool, italic: bool) -> BuiltinFont {
    match (Family::from_name(family), bold, italic) {
        (Family::Courier, true, true) => BuiltinFont::CourierBoldOblique,
        (Family::Courier, true, false) => BuiltinFont::CourierBold,
        (Family::Courier, false, true) => BuiltinFont::CourierOblique,
        (Family::Courier, false, false) => BuiltinFont::Courier,
        (Family::Helvetica, true, true) => BuiltinFont::HelveticaBoldOblique,
        (Family::Helvetica, true, false) => BuiltinFont::HelveticaBold,
        (Family::Helvetica, false, true) => BuiltinFont::HelveticaOblique,
        (Family::Helvetica, false, false) => BuiltinFont::Helvetica,
    }
}

/// Encode text as WinAnsi (Windows-1252) bytes, the encoding printpdf declares
/// for builtin fonts. Box-drawing characters have no WinAnsi glyph and fall
/// back to ASCII art; anything else outside the table becomes `?`.
fn to_winlatin(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            '\u{2500}' | '\u{2501}' => b'-',
            '\u{2502}' | '\u{2503}' => b'|',
            '\u{250C}' | '\u{2510}' | '\u{2514}' | '\u{2518}' | '\u{251C}' | '\u{2524}'
            | '\u{252C}' | '\u{2534}' | '\u{253C}' => b'+',
            '\u{2192}' => b'>', // rightwards arrow
            '\u{2713}' | '\u{2714}' => b'v',
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> std::result::Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "image src must be a base64 data URI (e.g. `data:image/png;base64,...`), got {preview:?}"
        ));
    };
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` after the header".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

/// Recursively collect all unique `image.src` strings from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: &[f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Corners of a rectangle in PDF space, counter-clockwise from bottom-left.
fn rect_points(x1: f32, y1: f32, x2: f32, y2: f32) -> Vec<LinePoint> {
    vec![point(x1, y1), point(x2, y1), point(x2, y2), point(x1, y2)]
}

fn write_text(ops: &mut Vec<Op>, text: &str, x: f32, y: f32, size: f32, font: BuiltinFont) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font,
    });
    // printpdf copies builtin-font text out as UTF-8, so the encoded bytes go
    // in a raw `Tj`. The empty write registers the font resource.
    ops.push(Op::WriteTextBuiltinFont {
        items: Vec::new(),
        font,
    });
    ops.push(Op::Unknown {
        key: "Tj".to_string(),
        value: vec![DictItem::String {
            data: to_winlatin(text),
            literal: false,
        }],
    });
    ops.push(Op::EndTextSection);
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
    fonts: &FontManager,
) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let pdf_y = page_height - lbox.y;
    let (x1, y1, x2, y2) = (lbox.x, pdf_y - lbox.height, lbox.x + lbox.width, pdf_y);

    if let Some(bg) = &lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: rect_points(x1, y1, x2, y2),
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(&border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: rect_points(x1, y1, x2, y2),
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        ops.push(Op::SetFillColor {
            col: rgb(&text.color),
        });
        let box_font = builtin_font(&text.font_family, text.bold, text.italic);
        let ascender = fonts.ascender_px(text.font_size, &text.font_family);

        for tline in &text.lines {
            if tline.text.is_empty() {
                continue;
            }
            // Baseline sits one ascender below the top of the line.
            let baseline = pdf_y - tline.y_offset - ascender;
            if tline.spans.is_empty() {
                write_text(
                    ops,
                    &tline.text,
                    lbox.x + tline.x_offset,
                    baseline,
                    text.font_size,
                    box_font,
                );
            } else {
                for span in &tline.spans {
                    let font = builtin_font(&span.font_family, span.bold, span.italic);
                    write_text(
                        ops,
                        &span.text,
                        lbox.x + span.x_offset,
                        baseline,
                        span.font_size,
                        font,
                    );
                }
            }

            if text.underline {
                let underline_y = baseline - text.font_size * 0.1;
                ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                ops.push(Op::SetOutlineColor {
                    col: rgb(&text.color),
                });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: vec![
                            point(lbox.x + tline.x_offset, underline_y),
                            point(lbox.x + lbox.width, underline_y),
                        ],
                        is_closed: false,
                    },
                });
            }
        }

        // List marker, hung 16 pt into the left gutter.
        if let Some(marker) = &text.list_marker {
            write_text(
                ops,
                marker,
                lbox.x - 16.0,
                pdf_y - ascender,
                text.font_size,
                BuiltinFont::Helvetica,
            );
        }
    }

    // Image – embed from pre-registered XObject
    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            let img_bottom_y = page_height - lbox.y - img.height;
            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                img.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height / res.px_height as f32
            } else {
                1.0
            };
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height, images, fonts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PageGeometry;

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::for_geometry(&PageGeometry::a4());
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn zero_sized_page_is_a_render_error() {
        let mut config = LayoutConfig::for_geometry(&PageGeometry::a4());
        config.page_width_pt = 0.0;
        assert!(matches!(render_pdf(&config), Err(Error::Render(_))));
    }

    #[test]
    fn builtin_faces_follow_family_and_emphasis() {
        assert_eq!(
            builtin_font("Helvetica", true, false),
            BuiltinFont::HelveticaBold
        );
        assert_eq!(builtin_font("Courier", false, false), BuiltinFont::Courier);
        assert_eq!(
            builtin_font("Courier", true, true),
            BuiltinFont::CourierBoldOblique
        );
    }

    #[test]
    fn box_drawing_maps_to_ascii() {
        assert_eq!(to_winlatin("├── docs"), b"+-- docs");
        assert_eq!(to_winlatin("│"), b"|");
        assert_eq!(to_winlatin("a\u{2022}b"), [b'a', 0x95, b'b']);
        assert_eq!(to_winlatin("20 \u{d7} 3 \u{2014} \u{4e2d}"), b"20 \xd7 3 \x97 ?");
    }

    #[test]
    fn text_is_shown_as_winansi_bytes() {
        let mut ops = Vec::new();
        write_text(&mut ops, "20 \u{d7} $30K", 10.0, 20.0, 9.0, BuiltinFont::Helvetica);
        let shown: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                Op::Unknown { key, value } if key == "Tj" => Some(value),
                _ => None,
            })
            .collect();
        assert_eq!(shown.len(), 1);
        assert!(matches!(
            shown[0].as_slice(),
            [DictItem::String { data, literal: false }] if data.as_slice() == b"20 \xd7 $30K"
        ));
        assert!(ops.iter().any(|op| matches!(
            op,
            Op::WriteTextBuiltinFont { items, font: BuiltinFont::Helvetica } if items.is_empty()
        )));
    }

    #[test]
    fn data_uri_must_be_base64() {
        assert!(parse_data_uri("photo.png").is_err());
        assert!(parse_data_uri("data:image/png,raw").is_err());
        assert_eq!(parse_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
    }
}
