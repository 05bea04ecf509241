//! Style/theme builder – turns a small palette configuration into the fixed
//! set of named block styles the content assembler refers to.
//!
//! [`Theme::build`] is a pure function of its [`Palette`]: the same palette
//! always yields an equal theme.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::style::{Color, TextAlign};

/// Every style a content block can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleName {
    Title,
    Subtitle,
    Tagline,
    SectionHeading,
    SubsectionHeading,
    MinorHeading,
    Body,
    Bullet,
    Code,
    Diagram,
    TableHeader,
    TableCell,
    Footer,
    Callout,
}

impl StyleName {
    pub const ALL: [StyleName; 14] = [
        StyleName::Title,
        StyleName::Subtitle,
        StyleName::Tagline,
        StyleName::SectionHeading,
        StyleName::SubsectionHeading,
        StyleName::MinorHeading,
        StyleName::Body,
        StyleName::Bullet,
        StyleName::Code,
        StyleName::Diagram,
        StyleName::TableHeader,
        StyleName::TableCell,
        StyleName::Footer,
        StyleName::Callout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleName::Title => "title",
            StyleName::Subtitle => "subtitle",
            StyleName::Tagline => "tagline",
            StyleName::SectionHeading => "section_heading",
            StyleName::SubsectionHeading => "subsection_heading",
            StyleName::MinorHeading => "minor_heading",
            StyleName::Body => "body",
            StyleName::Bullet => "bullet",
            StyleName::Code => "code",
            StyleName::Diagram => "diagram",
            StyleName::TableHeader => "table_header",
            StyleName::TableCell => "table_cell",
            StyleName::Footer => "footer",
            StyleName::Callout => "callout",
        }
    }
}

impl fmt::Display for StyleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A box drawn around a block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width: f32,
    pub color: Color,
}

/// A named bundle of visual attributes. Sizes and spacing are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStyle {
    pub font_family: String,
    pub font_size: f32,
    /// Baseline-to-baseline distance.
    pub leading: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    pub alignment: TextAlign,
    pub space_before: f32,
    pub space_after: f32,
    pub left_indent: f32,
    pub background: Option<Color>,
    pub border: Option<Border>,
    /// Gap between the text and its background/border. Drawn outside the
    /// block's flow height, so it never moves neighbouring blocks.
    pub border_padding: f32,
}

/// Size, leading and spacing for one style tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub size: f32,
    pub leading: f32,
    pub space_before: f32,
    pub space_after: f32,
}

impl Tier {
    pub const fn new(size: f32, leading: f32, space_before: f32, space_after: f32) -> Self {
        Self {
            size,
            leading,
            space_before,
            space_after,
        }
    }
}

/// Per-tier sizes for a palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeScale {
    pub title: Tier,
    pub subtitle: Tier,
    pub tagline: Tier,
    pub section: Tier,
    pub subsection: Tier,
    pub minor: Tier,
    pub body: Tier,
    pub bullet: Tier,
    pub code: Tier,
    pub diagram: Tier,
    pub table_header: Tier,
    pub table_cell: Tier,
    pub footer: Tier,
    pub callout: Tier,
    pub bullet_indent: f32,
    pub code_indent: f32,
    pub code_padding: f32,
    pub callout_padding: f32,
    pub callout_border: f32,
    /// Rule drawn around section headings, if any.
    pub section_rule: Option<f32>,
    pub section_rule_padding: f32,
}

/// Default cell formatting for tables in a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefaults {
    pub header_background: Color,
    pub header_text: Color,
    pub body_background: Option<Color>,
    pub zebra: Option<(Color, Color)>,
    pub grid_width: f32,
    pub grid_color: Color,
    pub padding_x: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub header_padding_bottom: f32,
}

/// Theme builder input: fonts, colours and a type scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub base_font: String,
    pub mono_font: String,
    pub text: Color,
    pub title: Color,
    pub section: Color,
    pub subsection: Color,
    pub muted: Color,
    pub rule: Color,
    pub accent: Color,
    pub code_background: Color,
    pub code_border: Color,
    pub callout_background: Color,
    pub scale: TypeScale,
    pub table: TableDefaults,
}

impl Palette {
    /// Dark slate headings on a 9 pt body, sized to fit two A4 pages.
    pub fn executive() -> Self {
        let slate = Color::rgb8(0x2c, 0x3e, 0x50);
        let blue = Color::rgb8(0x34, 0x98, 0xdb);
        Self {
            base_font: "Helvetica".to_string(),
            mono_font: "Courier".to_string(),
            text: Color::BLACK,
            title: Color::rgb8(0x1a, 0x1a, 0x1a),
            section: slate,
            subsection: Color::rgb8(0x34, 0x49, 0x5e),
            muted: Color::rgb8(0x66, 0x66, 0x66),
            rule: Color::rgb8(0xdd, 0xdd, 0xdd),
            accent: blue,
            code_background: Color::rgb8(0xf5, 0xf5, 0xf5),
            code_border: blue,
            callout_background: Color::rgb8(0xe8, 0xf4, 0xf8),
            scale: TypeScale {
                title: Tier::new(18.0, 22.0, 0.0, 6.0),
                subtitle: Tier::new(11.0, 12.0, 0.0, 12.0),
                tagline: Tier::new(10.0, 12.0, 0.0, 6.0),
                section: Tier::new(12.0, 15.0, 10.0, 6.0),
                subsection: Tier::new(10.0, 12.0, 6.0, 4.0),
                minor: Tier::new(9.0, 11.0, 4.0, 2.0),
                body: Tier::new(9.0, 11.0, 0.0, 4.0),
                bullet: Tier::new(9.0, 11.0, 0.0, 2.0),
                code: Tier::new(7.0, 8.5, 0.0, 4.0),
                diagram: Tier::new(7.0, 8.5, 0.0, 4.0),
                table_header: Tier::new(8.0, 9.6, 0.0, 0.0),
                table_cell: Tier::new(7.0, 8.4, 0.0, 0.0),
                footer: Tier::new(8.0, 11.0, 0.0, 0.0),
                callout: Tier::new(9.0, 11.0, 0.0, 4.0),
                bullet_indent: 10.0,
                code_indent: 10.0,
                code_padding: 4.0,
                callout_padding: 8.0,
                callout_border: 2.0,
                section_rule: Some(1.0),
                section_rule_padding: 3.0,
            },
            table: TableDefaults {
                header_background: slate,
                header_text: Color::rgb8(0xf5, 0xf5, 0xf5),
                body_background: None,
                zebra: Some((Color::WHITE, Color::rgb8(0xf9, 0xf9, 0xf9))),
                grid_width: 0.5,
                grid_color: Color::rgb8(0x80, 0x80, 0x80),
                padding_x: 6.0,
                padding_top: 2.0,
                padding_bottom: 2.0,
                header_padding_bottom: 4.0,
            },
        }
    }

    /// Blue headings on a 9.5 pt body, for longer multi-page documents.
    pub fn technical() -> Self {
        let blue = Color::rgb8(0x00, 0x66, 0xcc);
        let navy = Color::rgb8(0x00, 0x49, 0x99);
        let muted = Color::rgb8(0x66, 0x66, 0x66);
        Self {
            base_font: "Helvetica".to_string(),
            mono_font: "Courier".to_string(),
            text: Color::BLACK,
            title: blue,
            section: blue,
            subsection: navy,
            muted,
            rule: blue,
            accent: blue,
            code_background: Color::rgb8(0xf5, 0xf5, 0xf5),
            code_border: Color::rgb8(0xdd, 0xdd, 0xdd),
            callout_background: Color::rgb8(0xe8, 0xf4, 0xf8),
            scale: TypeScale {
                title: Tier::new(20.0, 24.0, 0.0, 6.0),
                subtitle: Tier::new(12.0, 14.0, 0.0, 20.0),
                tagline: Tier::new(10.0, 12.0, 0.0, 6.0),
                section: Tier::new(14.0, 18.0, 14.0, 8.0),
                subsection: Tier::new(12.0, 14.0, 10.0, 6.0),
                minor: Tier::new(10.0, 12.0, 8.0, 4.0),
                body: Tier::new(9.5, 12.0, 0.0, 6.0),
                bullet: Tier::new(9.5, 12.0, 0.0, 3.0),
                code: Tier::new(8.0, 10.0, 0.0, 8.0),
                diagram: Tier::new(7.0, 9.0, 0.0, 8.0),
                table_header: Tier::new(9.0, 10.8, 0.0, 0.0),
                table_cell: Tier::new(8.5, 10.2, 0.0, 0.0),
                footer: Tier::new(8.0, 12.0, 0.0, 6.0),
                callout: Tier::new(9.5, 12.0, 0.0, 6.0),
                bullet_indent: 20.0,
                code_indent: 10.0,
                code_padding: 6.0,
                callout_padding: 8.0,
                callout_border: 2.0,
                section_rule: None,
                section_rule_padding: 0.0,
            },
            table: TableDefaults {
                header_background: blue,
                header_text: Color::rgb8(0xf5, 0xf5, 0xf5),
                body_background: None,
                zebra: Some((Color::WHITE, Color::rgb8(0xf9, 0xf9, 0xf9))),
                grid_width: 0.5,
                grid_color: Color::rgb8(0x80, 0x80, 0x80),
                padding_x: 6.0,
                padding_top: 6.0,
                padding_bottom: 6.0,
                header_padding_bottom: 6.0,
            },
        }
    }
}

/// The complete, immutable mapping from style name to style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    styles: BTreeMap<StyleName, BlockStyle>,
    pub table: TableDefaults,
    pub mono_font: String,
}

impl Theme {
    /// Build every named style from a palette.
    pub fn build(palette: &Palette) -> Self {
        let scale = &palette.scale;
        let text = |tier: &Tier, color: Color| BlockStyle {
            font_family: palette.base_font.clone(),
            font_size: tier.size,
            leading: tier.leading,
            bold: false,
            italic: false,
            color,
            alignment: TextAlign::Left,
            space_before: tier.space_before,
            space_after: tier.space_after,
            left_indent: 0.0,
            background: None,
            border: None,
            border_padding: 0.0,
        };
        let code = |tier: &Tier| BlockStyle {
            font_family: palette.mono_font.clone(),
            left_indent: scale.code_indent,
            background: Some(palette.code_background),
            border: Some(Border {
                width: 1.0,
                color: palette.code_border,
            }),
            border_padding: scale.code_padding,
            ..text(tier, palette.text)
        };

        let mut styles = BTreeMap::new();
        styles.insert(
            StyleName::Title,
            BlockStyle {
                bold: true,
                alignment: TextAlign::Center,
                ..text(&scale.title, palette.title)
            },
        );
        styles.insert(
            StyleName::Subtitle,
            BlockStyle {
                italic: true,
                alignment: TextAlign::Center,
                ..text(&scale.subtitle, palette.muted)
            },
        );
        styles.insert(
            StyleName::Tagline,
            BlockStyle {
                alignment: TextAlign::Center,
                ..text(&scale.tagline, palette.muted)
            },
        );
        styles.insert(
            StyleName::SectionHeading,
            BlockStyle {
                bold: true,
                border: scale.section_rule.map(|width| Border {
                    width,
                    color: palette.rule,
                }),
                border_padding: scale.section_rule_padding,
                ..text(&scale.section, palette.section)
            },
        );
        styles.insert(
            StyleName::SubsectionHeading,
            BlockStyle {
                bold: true,
                ..text(&scale.subsection, palette.subsection)
            },
        );
        styles.insert(
            StyleName::MinorHeading,
            BlockStyle {
                bold: true,
                italic: true,
                ..text(&scale.minor, palette.subsection)
            },
        );
        styles.insert(
            StyleName::Body,
            BlockStyle {
                alignment: TextAlign::Justify,
                ..text(&scale.body, palette.text)
            },
        );
        styles.insert(
            StyleName::Bullet,
            BlockStyle {
                alignment: TextAlign::Justify,
                left_indent: scale.bullet_indent,
                ..text(&scale.bullet, palette.text)
            },
        );
        styles.insert(StyleName::Code, code(&scale.code));
        styles.insert(StyleName::Diagram, code(&scale.diagram));
        styles.insert(
            StyleName::TableHeader,
            BlockStyle {
                bold: true,
                ..text(&scale.table_header, palette.table.header_text)
            },
        );
        styles.insert(
            StyleName::TableCell,
            text(&scale.table_cell, palette.text),
        );
        styles.insert(
            StyleName::Footer,
            BlockStyle {
                alignment: TextAlign::Center,
                ..text(&scale.footer, palette.muted)
            },
        );
        styles.insert(
            StyleName::Callout,
            BlockStyle {
                bold: true,
                alignment: TextAlign::Center,
                background: Some(palette.callout_background),
                border: Some(Border {
                    width: scale.callout_border,
                    color: palette.accent,
                }),
                border_padding: scale.callout_padding,
                ..text(&scale.callout, palette.text)
            },
        );

        Self {
            styles,
            table: palette.table.clone(),
            mono_font: palette.mono_font.clone(),
        }
    }

    /// Look up a style. A theme built by [`Theme::build`] defines every name.
    pub fn style(&self, name: StyleName) -> Result<&BlockStyle> {
        self.styles
            .get(&name)
            .ok_or(Error::MissingStyle { style: name, block: 0 })
    }

    pub fn contains(&self, name: StyleName) -> bool {
        self.styles.contains_key(&name)
    }

    /// Replace or add a single style.
    pub fn insert(&mut self, name: StyleName, style: BlockStyle) {
        self.styles.insert(name, style);
    }

    /// Drop a style, returning it.
    pub fn remove(&mut self, name: StyleName) -> Option<BlockStyle> {
        self.styles.remove(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StyleName, &BlockStyle)> {
        self.styles.iter()
    }
}
