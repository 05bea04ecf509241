//! Inline text – styled runs, greedy line breaking and alignment.
//!
//! Paragraph text may carry a small markup subset: `<b>`, `<strong>`, `<i>`,
//! `<em>`, `<code>`, `<font face|name=… size=…>` and `<br/>`. Both layout
//! engines break runs into lines here and emit [`TextLine`]s carrying one
//! [`TextSpan`] per style change.

use std::mem;

use crate::dom::{parse_html, DomNode, ElementNode, Tag};
use crate::fonts::FontManager;
use crate::layout_config::{TextLine, TextSpan};
use crate::style::{family_from_css, TextAlign};

/// Font selection for a run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStyle {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl RunStyle {
    pub fn new(family: &str, size: f32) -> Self {
        Self {
            family: family.to_string(),
            size,
            bold: false,
            italic: false,
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    fn measure(&self, text: &str, fonts: &FontManager) -> f32 {
        fonts.measure_text_width(text, self.size, self.bold, self.italic, &self.family)
    }
}

/// A piece of inline content.
#[derive(Debug, Clone, PartialEq)]
pub enum Run {
    Text { text: String, style: RunStyle },
    /// Forced line break (`<br/>`).
    Break,
}

/// Parse inline markup into runs. Elements outside the subset pass their
/// children through unchanged.
pub fn parse_markup(markup: &str, base: &RunStyle) -> Vec<Run> {
    let mut runs = Vec::new();
    collect_runs(&parse_html(markup), base, &mut runs);
    runs
}

/// A single run of unparsed text, for table cells and other plain strings.
pub fn plain(text: &str, style: &RunStyle) -> Vec<Run> {
    vec![Run::Text {
        text: text.to_string(),
        style: style.clone(),
    }]
}

fn collect_runs(nodes: &[DomNode], style: &RunStyle, out: &mut Vec<Run>) {
    for node in nodes {
        match node {
            DomNode::Text(text) => out.push(Run::Text {
                text: text.clone(),
                style: style.clone(),
            }),
            DomNode::Element(e) if e.tag == Tag::Br => out.push(Run::Break),
            DomNode::Element(e) => collect_runs(&e.children, &element_style(e, style), out),
        }
    }
}

fn element_style(e: &ElementNode, parent: &RunStyle) -> RunStyle {
    let mut s = parent.clone();
    match e.tag {
        Tag::B | Tag::Strong => s.bold = true,
        Tag::I | Tag::Em => s.italic = true,
        Tag::Code => s.family = "Courier".to_string(),
        _ => {}
    }
    if let Some(face) = e
        .attributes
        .get("face")
        .or_else(|| e.attributes.get("name"))
    {
        s.family = family_from_css(face);
    }
    if let Some(size) = e
        .attributes
        .get("size")
        .and_then(|v| v.trim().parse::<f32>().ok())
    {
        s.size = size;
    }
    s
}

// ---------------------------------------------------------------------------
// Line breaking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Fragment {
    text: String,
    style: RunStyle,
    width: f32,
}

/// Adjacent fragments with no whitespace between them.
#[derive(Debug, Clone, Default)]
struct Word {
    fragments: Vec<Fragment>,
    width: f32,
    /// Width of the space that precedes the word on its line.
    space_before: f32,
}

enum Token {
    Word(Word),
    Break,
}

/// A broken line, before alignment.
#[derive(Debug, Clone, Default)]
pub struct Line {
    words: Vec<Word>,
    width: f32,
    /// Last line of the paragraph or ended by a forced break; never
    /// stretched when justifying.
    ends_paragraph: bool,
}

impl Line {
    /// Natural width of the line in points.
    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| {
                w.fragments
                    .iter()
                    .map(|f| f.text.as_str())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn tokenize(runs: &[Run], fonts: &FontManager) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word: Option<Word> = None;

    for run in runs {
        match run {
            Run::Break => {
                if let Some(w) = word.take() {
                    tokens.push(Token::Word(w));
                }
                tokens.push(Token::Break);
            }
            Run::Text { text, style } => {
                // NBSP is not ASCII whitespace, so it stays inside a word.
                for (i, piece) in text.split(|c: char| c.is_ascii_whitespace()).enumerate() {
                    if i > 0 {
                        if let Some(w) = word.take() {
                            tokens.push(Token::Word(w));
                        }
                    }
                    if piece.is_empty() {
                        continue;
                    }
                    let width = style.measure(piece, fonts);
                    let w = word.get_or_insert_with(Word::default);
                    w.width += width;
                    match w.fragments.last_mut() {
                        Some(last) if last.style == *style => {
                            last.text.push_str(piece);
                            last.width += width;
                        }
                        _ => w.fragments.push(Fragment {
                            text: piece.to_string(),
                            style: style.clone(),
                            width,
                        }),
                    }
                }
            }
        }
    }
    if let Some(w) = word.take() {
        tokens.push(Token::Word(w));
    }
    tokens
}

/// Greedily break runs into lines no wider than `max_width`. A word wider
/// than the line sits alone on its own line. Always returns at least one
/// line.
pub fn break_lines(runs: &[Run], max_width: f32, fonts: &FontManager) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line::default();

    for token in tokenize(runs, fonts) {
        match token {
            Token::Break => {
                current.ends_paragraph = true;
                lines.push(mem::take(&mut current));
            }
            Token::Word(mut word) => {
                let space = match word.fragments.first() {
                    Some(f) if !current.words.is_empty() => f.style.measure(" ", fonts),
                    _ => 0.0,
                };
                if !current.words.is_empty() && current.width + space + word.width > max_width + 0.01
                {
                    lines.push(mem::take(&mut current));
                    word.space_before = 0.0;
                } else {
                    word.space_before = space;
                }
                current.width += word.space_before + word.width;
                current.words.push(word);
            }
        }
    }
    if !current.words.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    if let Some(last) = lines.last_mut() {
        last.ends_paragraph = true;
    }
    lines
}

/// Position broken lines inside a box `width` points wide.
pub fn place(lines: &[Line], align: TextAlign, width: f32, leading: f32) -> Vec<TextLine> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| place_line(line, align, width, i as f32 * leading))
        .collect()
}

fn place_line(line: &Line, align: TextAlign, width: f32, y_offset: f32) -> TextLine {
    let slack = (width - line.width).max(0.0);
    let justify = align == TextAlign::Justify && !line.ends_paragraph && line.words.len() > 1;
    let start = match align {
        TextAlign::Center => slack / 2.0,
        TextAlign::Right => slack,
        TextAlign::Left | TextAlign::Justify => 0.0,
    };
    let stretch = if justify {
        slack / (line.words.len() - 1) as f32
    } else {
        0.0
    };

    let mut spans: Vec<TextSpan> = Vec::new();
    let mut x = start;
    for (k, word) in line.words.iter().enumerate() {
        let mut new_word = false;
        if k > 0 {
            x += word.space_before + stretch;
            new_word = true;
        }
        for frag in &word.fragments {
            match spans.last_mut() {
                Some(span) if same_style(span, &frag.style) && !(justify && new_word) => {
                    if new_word {
                        span.text.push(' ');
                    }
                    span.text.push_str(&frag.text);
                }
                _ => spans.push(TextSpan {
                    text: frag.text.clone(),
                    x_offset: x,
                    font_family: frag.style.family.clone(),
                    font_size: frag.style.size,
                    bold: frag.style.bold,
                    italic: frag.style.italic,
                }),
            }
            x += frag.width;
            new_word = false;
        }
    }

    TextLine {
        text: line.text(),
        x_offset: start,
        y_offset,
        spans,
    }
}

fn same_style(span: &TextSpan, style: &RunStyle) -> bool {
    span.font_family == style.family
        && span.font_size == style.size
        && span.bold == style.bold
        && span.italic == style.italic
}

/// Lines of preformatted text, kept verbatim and never wrapped.
pub fn preformatted(text: &str, style: &RunStyle, leading: f32) -> Vec<TextLine> {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            let line = line.trim_end();
            let spans = if line.is_empty() {
                Vec::new()
            } else {
                vec![TextSpan {
                    text: line.to_string(),
                    x_offset: 0.0,
                    font_family: style.family.clone(),
                    font_size: style.size,
                    bold: style.bold,
                    italic: style.italic,
                }]
            };
            TextLine {
                text: line.to_string(),
                x_offset: 0.0,
                y_offset: i as f32 * leading,
                spans,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> RunStyle {
        RunStyle::new("Helvetica", 9.0)
    }

    #[test]
    fn markup_runs_carry_emphasis() {
        let runs = parse_markup("<b>Result:</b> High <i>costs</i><br/>next", &body());
        assert_eq!(runs.len(), 5);
        assert!(matches!(&runs[0], Run::Text { style, .. } if style.bold));
        assert!(matches!(&runs[2], Run::Text { style, .. } if style.italic && !style.bold));
        assert_eq!(runs[3], Run::Break);
    }

    #[test]
    fn font_tag_switches_family_and_size() {
        let runs = parse_markup("<font face='Courier' size='8'>emir install</font>", &body());
        let Run::Text { style, .. } = &runs[0] else {
            panic!("expected text");
        };
        assert_eq!(style.family, "Courier");
        assert_eq!(style.size, 8.0);
    }

    #[test]
    fn lines_fit_the_measure() {
        let fonts = FontManager::default();
        let text = "The regulatory package manager resolves document dependencies the way software package managers resolve code dependencies.";
        let lines = break_lines(&plain(text, &body()), 150.0, &fonts);
        assert!(lines.len() > 2);
        for line in &lines {
            assert!(line.width() <= 150.01, "{} is {}", line.text(), line.width());
        }
        let rejoined: Vec<String> = lines.iter().map(Line::text).collect();
        assert_eq!(rejoined.join(" "), text);
    }

    #[test]
    fn forced_break_ends_line() {
        let fonts = FontManager::default();
        let lines = break_lines(&parse_markup("one<br/>two", &body()), 500.0, &fonts);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text(), "two");
    }

    #[test]
    fn justify_fills_all_but_last_line() {
        let fonts = FontManager::default();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        let lines = break_lines(&plain(text, &body()), 120.0, &fonts);
        let placed = place(&lines, TextAlign::Justify, 120.0, 11.0);
        let first = &placed[0];
        let last_span = first.spans.last().unwrap();
        let end = last_span.x_offset
            + fonts.measure_text_width(&last_span.text, 9.0, false, false, "Helvetica");
        assert!((end - 120.0).abs() < 0.05, "ends at {end}");
        let final_line = placed.last().unwrap();
        assert_eq!(final_line.spans.len(), 1, "last line stays ragged");
        assert_eq!(placed[1].y_offset, 11.0);
    }

    #[test]
    fn centred_line_is_offset_by_half_the_slack() {
        let fonts = FontManager::default();
        let lines = break_lines(&plain("Hello", &body()), 100.0, &fonts);
        let placed = place(&lines, TextAlign::Center, 100.0, 11.0);
        let w = fonts.measure_text_width("Hello", 9.0, false, false, "Helvetica");
        assert!((placed[0].x_offset - (100.0 - w) / 2.0).abs() < 0.01);
    }

    #[test]
    fn style_change_starts_new_span() {
        let fonts = FontManager::default();
        let runs = parse_markup("<b>Tier:</b> free access", &body());
        let lines = break_lines(&runs, 500.0, &fonts);
        let placed = place(&lines, TextAlign::Left, 500.0, 11.0);
        let spans = &placed[0].spans;
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Tier:");
        assert_eq!(spans[1].text, "free access");
        assert!(spans[1].x_offset > spans[0].x_offset);
    }

    #[test]
    fn preformatted_keeps_indentation() {
        let code = RunStyle::new("Courier", 8.0);
        let lines = preformatted("emir/\n  package.yaml\n", &code, 10.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "  package.yaml");
        assert_eq!(lines[1].y_offset, 10.0);
    }
}
