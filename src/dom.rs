//! HTML parser – converts markup into a simple DOM tree.
//!
//! Two callers share it: the markup pipeline parses whole documents, and
//! the inline module parses the rich-text subset used in paragraph text.
//!
//! Supported elements:
//! - Structural: div, p, h1-h4, pre, ul, ol, li, table, tr, td, th, img
//! - Inline: span, b, strong, i, em, code, font, br
//! - Metadata (parsed, never rendered): head, style, title, meta
//! - Styling via the `style` attribute

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H1,
    H2,
    H3,
    H4,
    Pre,
    Ul,
    Ol,
    Li,
    Table,
    Tr,
    Td,
    Th,
    Span,
    B,
    Strong,
    I,
    Em,
    Code,
    Font,
    Br,
    Img,
    Body,
    Html,
    Head,
    Style,
    Title,
    Meta,
    /// Catch-all for unknown tags – they are kept but never rendered.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "pre" => Tag::Pre,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" => Tag::Span,
            "b" => Tag::B,
            "strong" => Tag::Strong,
            "i" => Tag::I,
            "em" => Tag::Em,
            "code" => Tag::Code,
            "font" => Tag::Font,
            "br" => Tag::Br,
            "img" => Tag::Img,
            "body" => Tag::Body,
            "html" => Tag::Html,
            "head" => Tag::Head,
            "style" => Tag::Style,
            "title" => Tag::Title,
            "meta" => Tag::Meta,
            _ => Tag::Unknown(s.to_string()),
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4)
    }

    /// Block elements whose inline content is flowed as one paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Tag::P | Tag::Li | Tag::Td | Tag::Th) || self.is_heading()
    }

    /// Elements that never have children or a closing tag.
    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Img | Tag::Br | Tag::Meta)
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                DomNode::Text(t) => out.push_str(t),
                DomNode::Element(e) => out.push_str(&e.text_content()),
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
///
/// Hand-written recursive descent over the controlled subset above. Unclosed
/// elements close at end of input; stray closing tags end the current level.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            let spaced = self.skip_whitespace_preserve();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if spaced && !nodes.is_empty() {
                nodes.push(DomNode::Text(" ".to_string()));
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_comment();
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            // Skip doctype / processing instructions
            while !self.eof() && !self.starts_with(">") {
                self.advance(1);
            }
            if !self.eof() {
                self.advance(1); // skip '>'
            }
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        while !self.eof() && !self.starts_with("<") {
            self.advance(1);
        }
        let text = &self.input[start..self.pos];
        DomNode::Text(decode_entities(text))
    }

    fn parse_element(&mut self) -> DomNode {
        // Consume '<'
        self.advance(1);
        let tag_name = self.parse_tag_name();
        let tag = Tag::from_name(&tag_name);
        let mut elem = ElementNode::new(tag.clone());

        // Parse attributes
        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let (key, value) = self.parse_attribute();
            if key.is_empty() {
                // Stray character inside the tag; step over it.
                self.advance(1);
                continue;
            }
            elem.attributes.insert(key.to_ascii_lowercase(), value);
        }

        let self_closing = tag.is_void();
        if self.starts_with("/>") {
            self.advance(2);
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if self_closing {
            return DomNode::Element(elem);
        }

        // Parse children
        elem.children = self.parse_nodes();

        // Consume closing tag
        if self.starts_with("</") {
            self.advance(2);
            self.parse_tag_name(); // skip tag name
            self.skip_whitespace();
            if self.starts_with(">") {
                self.advance(1);
            }
        }

        DomNode::Element(elem)
    }

    fn parse_tag_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_tag_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        if self.starts_with("\"") {
            self.advance(1);
            let start = self.pos;
            while !self.eof() && !self.starts_with("\"") {
                self.advance(1);
            }
            let val = self.input[start..self.pos].to_string();
            if !self.eof() {
                self.advance(1);
            }
            decode_entities(&val)
        } else if self.starts_with("'") {
            self.advance(1);
            let start = self.pos;
            while !self.eof() && !self.starts_with("'") {
                self.advance(1);
            }
            let val = self.input[start..self.pos].to_string();
            if !self.eof() {
                self.advance(1);
            }
            decode_entities(&val)
        } else {
            let start = self.pos;
            while !self.eof() {
                let c = self.current_char();
                if c.is_whitespace() || c == '>' || c == '/' {
                    break;
                }
                self.advance(1);
            }
            self.input[start..self.pos].to_string()
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
    }

    /// Skip a run of pure whitespace before a tag. Returns true when the run
    /// stayed on one line: that run separates inline elements and becomes a
    /// single space, while runs spanning a line break are indentation.
    fn skip_whitespace_preserve(&mut self) -> bool {
        let saved = self.pos;
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
        // If we reached a tag or EOF, keep the skip. Otherwise revert.
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
            return false;
        }
        let run = &self.input[saved..self.pos];
        !run.is_empty() && !run.contains('\n')
    }

    fn skip_comment(&mut self) {
        self.advance(4); // skip <!--
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(3);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&times;", "\u{00D7}")
        .replace("&bull;", "\u{2022}")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Find the `<body>` element and return its children, or return all nodes if
/// no `<body>` is present.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    match find_body(nodes) {
        Some(body) => body.children.clone(),
        None => nodes.to_vec(),
    }
}

/// Text of the first `<title>` element, trimmed.
pub fn document_title(nodes: &[DomNode]) -> Option<String> {
    nodes.iter().find_map(|node| match node {
        DomNode::Element(e) if e.tag == Tag::Title => {
            let title = e.text_content().trim().to_string();
            (!title.is_empty()).then_some(title)
        }
        DomNode::Element(e) => document_title(&e.children),
        DomNode::Text(_) => None,
    })
}

fn find_body(nodes: &[DomNode]) -> Option<&ElementNode> {
    nodes.iter().find_map(|node| match node {
        DomNode::Element(e) if e.tag == Tag::Body => Some(e),
        // Recurse into <html>
        DomNode::Element(e) if e.tag == Tag::Html => find_body(&e.children),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_styled_paragraph() {
        let html = r#"<p style="font-size: 9pt"><b>Result:</b> High costs</p>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        let DomNode::Element(p) = &nodes[0] else {
            panic!("Expected element");
        };
        assert_eq!(p.tag, Tag::P);
        assert_eq!(p.inline_style(), Some("font-size: 9pt"));
        assert_eq!(p.children.len(), 2); // <b>, " High costs"
        assert!(matches!(&p.children[1], DomNode::Text(t) if t == " High costs"));
    }

    #[test]
    fn void_elements_close_themselves() {
        for html in [
            "<font name='Courier'>a:b</font><br/><font>c</font>",
            "<font name='Courier'>a:b</font><br><font>c</font>",
        ] {
            let nodes = parse_html(html);
            assert_eq!(nodes.len(), 3, "{html}");
            let DomNode::Element(br) = &nodes[1] else {
                panic!("Expected <br>");
            };
            assert_eq!(br.tag, Tag::Br);
            assert!(br.children.is_empty());
        }
    }

    #[test]
    fn single_quoted_attributes() {
        let nodes = parse_html("<font face='Courier' size='8'>emir-bom</font>");
        let DomNode::Element(font) = &nodes[0] else {
            panic!("Expected <font>");
        };
        assert_eq!(font.attributes.get("face").map(String::as_str), Some("Courier"));
        assert_eq!(font.attributes.get("size").map(String::as_str), Some("8"));
    }

    #[test]
    fn entities_are_decoded() {
        let nodes = parse_html("<p>&lt;5 minutes &amp; 20 &times; $30K</p>");
        let DomNode::Element(p) = &nodes[0] else {
            panic!("Expected <p>");
        };
        assert!(matches!(&p.children[0], DomNode::Text(t) if t == "<5 minutes & 20 \u{00D7} $30K"));
    }

    #[test]
    fn body_children_skip_head() {
        let html = r#"<!DOCTYPE html><html><head><meta charset="utf-8"><style>@page { margin: 0 }</style></head><body><h1>T</h1><p>x</p></body></html>"#;
        let body = body_children(&parse_html(html));
        assert_eq!(body.len(), 2);
        assert!(matches!(&body[0], DomNode::Element(e) if e.tag == Tag::H1));
    }

    #[test]
    fn space_between_inline_elements_survives() {
        let nodes = parse_html("<p><b>Tier</b> <i>one</i></p>");
        let DomNode::Element(p) = &nodes[0] else {
            panic!("Expected <p>");
        };
        assert_eq!(p.children.len(), 3);
        assert!(matches!(&p.children[1], DomNode::Text(t) if t == " "));

        let nodes = parse_html("<div>\n  <p>a</p>\n  <p>b</p>\n</div>");
        let DomNode::Element(div) = &nodes[0] else {
            panic!("Expected <div>");
        };
        assert_eq!(div.children.len(), 2);
    }

    #[test]
    fn title_is_found_in_head() {
        let html = "<html><head><title> Executive &amp; Summary </title></head><body></body></html>";
        assert_eq!(
            document_title(&parse_html(html)).as_deref(),
            Some("Executive & Summary")
        );
        assert_eq!(document_title(&parse_html("<p>x</p>")), None);
    }

    #[test]
    fn escaped_ampersand_decodes_once() {
        let nodes = parse_html("<p>&amp;lt;</p>");
        let DomNode::Element(p) = &nodes[0] else {
            panic!("Expected <p>");
        };
        assert_eq!(p.text_content(), "&lt;");
    }

    #[test]
    fn parse_table() {
        let html = r#"<table><tr><th>Tier</th><th>Access</th></tr><tr><td>Public</td><td>Free</td></tr></table>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        let DomNode::Element(table) = &nodes[0] else {
            panic!("Expected table");
        };
        assert_eq!(table.tag, Tag::Table);
        assert_eq!(table.children.len(), 2);
    }
}
