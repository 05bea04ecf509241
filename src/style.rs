//! Style resolver – maps tag defaults and inline `style` attributes to a flat
//! [`ComputedStyle`] struct consumed by the markup layout engine.
//!
//! [`Color`] and [`TextAlign`] are shared with the theme builder.

use serde::{Deserialize, Serialize};

use crate::dom::{DomNode, ElementNode, Tag};
use crate::geometry::{CM, MM};

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Spacing (pt)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            font_size: 12.0,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.2,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    InlineBlock,
    ListItem,
    Table,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb8(0, 0, 0);
    pub const WHITE: Self = Self::rgb8(0xff, 0xff, 0xff);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Opaque colour from 8-bit channels, e.g. `Color::rgb8(0x2c, 0x3e, 0x50)`.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    /// `#rrggbb` form, used when emitting inline CSS.
    pub fn to_hex(&self) -> String {
        let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", ch(self.r), ch(self.g), ch(self.b))
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb8(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// Parse a CSS colour value: `#hex` or one of the few keywords the
    /// documents use.
    pub fn from_css(val: &str) -> Option<Self> {
        match val.trim() {
            "white" => Some(Self::WHITE),
            "black" => Some(Self::BLACK),
            "whitesmoke" => Some(Self::rgb8(0xf5, 0xf5, 0xf5)),
            "grey" | "gray" => Some(Self::rgb8(0x80, 0x80, 0x80)),
            "beige" => Some(Self::rgb8(0xf5, 0xf5, 0xdc)),
            "transparent" => Some(Self::TRANSPARENT),
            other if other.starts_with('#') => Self::from_hex(other),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element, inheriting text properties from its parent.
pub fn resolve_style(element: &ElementNode, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = base_style_for_tag(&element.tag);

    // Inherit text properties from parent. Emphasis tags keep their own
    // weight/style on top of the inherited values.
    if let Some(p) = parent {
        if !element.tag.is_heading() {
            style.font_size = p.font_size;
            style.line_height = p.line_height;
        }
        style.font_family = p.font_family.clone();
        style.color = p.color;
        style.text_align = p.text_align;
        if !matches!(element.tag, Tag::B | Tag::Strong | Tag::Th) && !element.tag.is_heading() {
            style.font_weight = p.font_weight;
        }
        if !matches!(element.tag, Tag::I | Tag::Em) {
            style.font_style = p.font_style;
        }
    }

    // `<font face=…>` / `<font name=…>` and `<code>` switch families.
    if let Some(face) = element
        .attributes
        .get("face")
        .or_else(|| element.attributes.get("name"))
    {
        style.font_family = family_from_css(face);
    }
    if matches!(element.tag, Tag::Code | Tag::Pre) {
        style.font_family = "Courier".to_string();
    }
    if let Some(size) = element.attributes.get("size").and_then(|v| parse_px(v)) {
        style.font_size = size;
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    style
}

/// Default styles based on tag semantics. Sizes are in points.
fn base_style_for_tag(tag: &Tag) -> ComputedStyle {
    let mut s = ComputedStyle::default();
    match tag {
        Tag::H1 => {
            s.font_size = 18.0;
            s.font_weight = FontWeight::Bold;
            s.margin_bottom = 6.0;
        }
        Tag::H2 => {
            s.font_size = 14.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 10.0;
            s.margin_bottom = 6.0;
        }
        Tag::H3 => {
            s.font_size = 12.0;
            s.font_weight = FontWeight::Bold;
            s.margin_top = 8.0;
            s.margin_bottom = 4.0;
        }
        Tag::H4 => {
            s.font_size = 10.0;
            s.font_weight = FontWeight::Bold;
            s.font_style = FontStyle::Italic;
            s.margin_top = 6.0;
            s.margin_bottom = 4.0;
        }
        Tag::P => {
            s.margin_bottom = 6.0;
        }
        Tag::Pre => {
            s.margin_bottom = 6.0;
        }
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = 6.0;
            s.padding_left = 18.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 2.0;
        }
        Tag::Table => {
            s.display = Display::Table;
            s.margin_bottom = 6.0;
        }
        Tag::Tr => {
            s.display = Display::TableRow;
        }
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 3.0;
            s.padding_right = 6.0;
            s.padding_bottom = 3.0;
            s.padding_left = 6.0;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
            }
        }
        Tag::Span | Tag::Br | Tag::Code | Tag::Font => {
            s.display = Display::Inline;
        }
        Tag::B | Tag::Strong => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::I | Tag::Em => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::Img => {
            s.display = Display::InlineBlock;
        }
        Tag::Div | Tag::Body | Tag::Html => {}
        Tag::Head | Tag::Style | Tag::Title | Tag::Meta | Tag::Unknown(_) => {
            // Metadata and unrecognised elements do not render.
            s.display = Display::None;
        }
    }
    s
}

// ---------------------------------------------------------------------------
// Inline style parsing (limited subset)
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in style_str.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        apply_css_property(s, prop.trim(), val.trim());
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "flex-wrap" => {
            s.flex_wrap = match val {
                "wrap" => FlexWrap::Wrap,
                _ => FlexWrap::NoWrap,
            }
        }
        "flex" | "flex-grow" => {
            if let Some(v) = val.split_whitespace().next().and_then(|v| v.parse().ok()) {
                s.flex_grow = v;
            }
        }
        "justify-content" => {
            s.justify_content = match val {
                "flex-end" | "end" => JustifyContent::End,
                "center" => JustifyContent::Center,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => JustifyContent::Start,
            }
        }
        "align-items" => {
            s.align_items = match val {
                "flex-start" | "start" => AlignItems::Start,
                "flex-end" | "end" => AlignItems::End,
                "center" => AlignItems::Center,
                _ => AlignItems::Stretch,
            }
        }
        "font-size" => {
            if let Some(pt) = parse_px(val) {
                s.font_size = pt;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            s.font_family = family_from_css(val);
        }
        "text-decoration" => {
            s.text_decoration = if val.contains("underline") {
                TextDecoration::Underline
            } else {
                TextDecoration::None
            }
        }
        "color" => {
            if let Some(c) = Color::from_css(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::from_css(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                "justify" => TextAlign::Justify,
                _ => TextAlign::Left,
            }
        }
        "width" => {
            s.width = parse_dimension(val);
        }
        "height" => {
            s.height = parse_dimension(val);
        }
        "max-width" => {
            s.max_width = parse_dimension(val);
        }
        "margin" => apply_shorthand_spacing(
            val,
            &mut s.margin_top,
            &mut s.margin_right,
            &mut s.margin_bottom,
            &mut s.margin_left,
        ),
        "margin-top" => set_length(&mut s.margin_top, val),
        "margin-right" => set_length(&mut s.margin_right, val),
        "margin-bottom" => set_length(&mut s.margin_bottom, val),
        "margin-left" => set_length(&mut s.margin_left, val),
        "padding" => apply_shorthand_spacing(
            val,
            &mut s.padding_top,
            &mut s.padding_right,
            &mut s.padding_bottom,
            &mut s.padding_left,
        ),
        "padding-top" => set_length(&mut s.padding_top, val),
        "padding-right" => set_length(&mut s.padding_right, val),
        "padding-bottom" => set_length(&mut s.padding_bottom, val),
        "padding-left" => set_length(&mut s.padding_left, val),
        // `border: 1pt solid #ddd` – width and colour in any order.
        "border" => {
            for part in val.split_whitespace() {
                if let Some(w) = parse_px(part) {
                    s.border_width = w;
                } else if let Some(c) = Color::from_css(part) {
                    s.border_color = c;
                }
            }
        }
        "border-width" => set_length(&mut s.border_width, val),
        "border-color" => {
            if let Some(c) = Color::from_css(val) {
                s.border_color = c;
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(pt) = parse_px(val) {
                s.line_height = pt / s.font_size;
            }
        }
        "gap" => set_length(&mut s.gap, val),
        "break-after" | "page-break-after" => {
            s.page_break_after = val == "always" || val == "page";
        }
        "break-before" | "page-break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "break-inside" | "page-break-inside" => {
            s.page_break_inside_avoid = val == "avoid";
        }
        _ => {}
    }
}

fn set_length(target: &mut f32, val: &str) {
    if let Some(pt) = parse_px(val) {
        *target = pt;
    }
}

/// Parse a CSS length into points. `px` and bare numbers are taken as
/// points since the layout works in points throughout; `pt`, `mm` and `cm`
/// are converted.
fn parse_px(s: &str) -> Option<f32> {
    let s = s.trim();
    let (num, scale) = if let Some(v) = s.strip_suffix("px") {
        (v, 1.0)
    } else if let Some(v) = s.strip_suffix("pt") {
        (v, 1.0)
    } else if let Some(v) = s.strip_suffix("mm") {
        (v, MM)
    } else if let Some(v) = s.strip_suffix("cm") {
        (v, CM)
    } else {
        (s, 1.0)
    };
    num.trim().parse::<f32>().ok().map(|v| v * scale)
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_px(s).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

fn apply_shorthand_spacing(
    val: &str,
    top: &mut f32,
    right: &mut f32,
    bottom: &mut f32,
    left: &mut f32,
) {
    let parts: Vec<f32> = val.split_whitespace().filter_map(parse_px).collect();
    match parts.as_slice() {
        [all] => {
            *top = *all;
            *right = *all;
            *bottom = *all;
            *left = *all;
        }
        [vertical, horizontal] => {
            *top = *vertical;
            *bottom = *vertical;
            *right = *horizontal;
            *left = *horizontal;
        }
        [t, horizontal, b] => {
            *top = *t;
            *right = *horizontal;
            *bottom = *b;
            *left = *horizontal;
        }
        [t, r, b, l] => {
            *top = *t;
            *right = *r;
            *bottom = *b;
            *left = *l;
        }
        _ => {}
    }
}

/// Map a CSS font-family list onto one of the builtin PDF families.
pub fn family_from_css(val: &str) -> String {
    let lower = val.to_ascii_lowercase();
    if lower.contains("courier") || lower.contains("mono") {
        "Courier".to_string()
    } else {
        "Helvetica".to_string()
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: std::collections::HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style);
                let children = build_styled_tree(&e.children, Some(&style));
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                // Whitespace-only text is kept: it separates inline runs and
                // the layout drops it between blocks.
                if !text.is_empty() {
                    // Text renders inline: keep typography, drop the box model.
                    let parent = parent_style.cloned().unwrap_or_default();
                    let style = ComputedStyle {
                        font_size: parent.font_size,
                        font_weight: parent.font_weight,
                        font_family: parent.font_family,
                        color: parent.color,
                        text_align: parent.text_align,
                        line_height: parent.line_height,
                        text_decoration: parent.text_decoration,
                        font_style: parent.font_style,
                        ..ComputedStyle::default()
                    };
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style,
                    });
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_style_font_size() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "font-size: 24px; color: #ff0000");
        assert_eq!(s.font_size, 24.0);
        assert!((s.color.r - 1.0).abs() < 0.01);
    }

    #[test]
    fn inline_style_units_and_family() {
        let mut s = ComputedStyle::default();
        apply_inline_style(
            &mut s,
            "font-size: 9pt; margin-top: 1cm; text-align: justify; font-family: 'Courier New', monospace",
        );
        assert_eq!(s.font_size, 9.0);
        assert!((s.margin_top - CM).abs() < 0.01);
        assert_eq!(s.text_align, TextAlign::Justify);
        assert_eq!(s.font_family, "Courier");
    }

    #[test]
    fn border_shorthand() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "border: 0.5pt solid #808080");
        assert_eq!(s.border_width, 0.5);
        assert_eq!(s.border_color, Color::rgb8(0x80, 0x80, 0x80));
    }

    #[test]
    fn emphasis_survives_inheritance() {
        let parent = ComputedStyle::default();
        let b = ElementNode::new(Tag::B);
        assert_eq!(resolve_style(&b, Some(&parent)).font_weight, FontWeight::Bold);
        let code = ElementNode::new(Tag::Code);
        assert_eq!(resolve_style(&code, Some(&parent)).font_family, "Courier");
    }

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::rgb8(0x2c, 0x3e, 0x50).to_hex(), "#2c3e50");
        assert_eq!(Color::from_hex("#ddd").map(|c| c.to_hex()).as_deref(), Some("#dddddd"));
    }
}
