//! Text accumulation and whitespace collapsing.

use std::sync::LazyLock;

use ego_tree::NodeRef;
use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Node};

/// Any run of whitespace, non-breaking spaces and byte order marks included.
#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\u{00A0}\u{FEFF}]+").expect("WHITESPACE_RUN regex"));

/// Elements whose subtrees never contribute text or links.
pub const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

/// Elements that start a new line in rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "caption", "dd", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

/// Whether an element with this tag is dropped with its subtree.
pub fn is_skipped_tag(name: &str) -> bool {
    SKIPPED_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

/// Namespace of elements parsed as HTML, as opposed to SVG or MathML.
const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Whether `el` is the HTML element `name`. SVG and MathML elements sharing
/// the local name do not count.
pub fn is_html_element(el: &Element, name: &str) -> bool {
    &*el.name.ns == HTML_NAMESPACE && el.name() == name
}

/// Whether an element with this tag renders on lines of its own.
pub fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Collapses every whitespace run to one ASCII space and trims the ends.
///
/// ```rust
/// use harvest_core::text::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Hello \u{a0}\n world "), "Hello world");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim_matches(' ').to_string()
}

/// Raw text gathered during a walk.
///
/// Pieces are appended untouched; [`TextBuffer::finish`] collapses the whole
/// buffer once, so whitespace split across nodes ends up as a single space.
#[derive(Debug, Default, Clone)]
pub struct TextBuffer {
    raw: String,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) {
        self.raw.push_str(text);
    }

    /// Marks a boundary between two pieces of text, such as the end of a
    /// paragraph. Boundaries collapse like any other whitespace.
    pub fn push_break(&mut self) {
        if !self.raw.is_empty() && !self.raw.ends_with('\n') {
            self.raw.push('\n');
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The collapsed, trimmed text.
    pub fn finish(self) -> String {
        collapse_whitespace(&self.raw)
    }
}

/// Rendered text of an element, collapsed.
///
/// Follows what a browser renders for the element: script, style, noscript
/// and template content is left out, `<br>` breaks the line and block-level
/// children sit on lines of their own.
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_rendered(*element, &mut raw);
    collapse_whitespace(&raw)
}

fn push_rendered(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if is_skipped_tag(name) || name == "template" {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }

                let block = is_block_tag(name);
                if block {
                    out.push('\n');
                }
                push_rendered(child, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}
