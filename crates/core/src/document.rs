//! Loaded documents and the tree queries extraction needs.
//!
//! A [`Document`] pairs an immutable `scraper` tree with the URL it was loaded
//! from. Besides plain structural queries it models the two kinds of content
//! that sit outside the light DOM:
//!
//! - open shadow roots, written as declarative shadow DOM
//!   (`<template shadowrootmode="open">` inside the host),
//! - iframe documents, attached by the host keyed by `src` or carried inline
//!   through `srcdoc`.
//!
//! # Example
//!
//! ```rust
//! use harvest_core::Document;
//!
//! let doc = Document::parse(
//!     r#"<div id="main"><p>Hello</p></div>"#,
//!     "https://example.com/articles/1",
//! ).unwrap();
//!
//! assert!(doc.query_selector("#main").is_some());
//! assert_eq!(doc.base_uri().as_str(), "https://example.com/articles/1");
//! ```

use std::collections::HashMap;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::{HarvestError, Result};

/// A loaded document: the parsed tree plus its location.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
    location: Url,
    frames: HashMap<String, Document>,
}

/// Outcome of asking an `<iframe>` element for its content document.
#[derive(Debug)]
pub enum FrameAccess<'a> {
    /// A frame document attached by the host.
    Attached(&'a Document),
    /// A `srcdoc` frame built on demand; it shares the parent's origin.
    Inline(Box<Document>),
    /// The frame is loaded but its origin differs from the parent's.
    CrossOrigin { origin: String },
    /// Nothing is loaded for this frame.
    Unavailable,
}

impl FrameAccess<'_> {
    /// The content document when access is permitted.
    pub fn document(&self) -> Option<&Document> {
        match self {
            FrameAccess::Attached(doc) => Some(*doc),
            FrameAccess::Inline(doc) => Some(doc.as_ref()),
            FrameAccess::CrossOrigin { .. } | FrameAccess::Unavailable => None,
        }
    }
}

impl Document {
    /// Builds a document from markup loaded at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidUrl`] if `location` is not an absolute URL.
    pub fn parse(markup: &str, location: &str) -> Result<Self> {
        let location = Url::parse(location).map_err(|e| HarvestError::InvalidUrl(format!("{}: {}", location, e)))?;
        Ok(Self::from_html(Html::parse_document(markup), location))
    }

    /// Wraps an already parsed tree.
    pub fn from_html(html: Html, location: Url) -> Self {
        Self { html, location, frames: HashMap::new() }
    }

    /// Attaches the content document of every iframe whose `src` is `src`.
    ///
    /// `src` is matched against the raw attribute first and then against the
    /// attribute resolved to an absolute URL.
    pub fn attach_frame(&mut self, src: impl Into<String>, frame: Document) {
        self.frames.insert(src.into(), frame);
    }

    /// Builder-style [`Document::attach_frame`].
    pub fn with_frame(mut self, src: impl Into<String>, frame: Document) -> Self {
        self.attach_frame(src, frame);
        self
    }

    /// The URL the document was loaded from.
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// The underlying `scraper` tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The document base URI: the first `<base href>` resolved against the
    /// location, or the location itself.
    pub fn base_uri(&self) -> Url {
        self.query_selector("base[href]")
            .and_then(|base| base.value().attr("href"))
            .and_then(|href| self.location.join(href).ok())
            .unwrap_or_else(|| self.location.clone())
    }

    /// The `<body>` element.
    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.query_selector("body")
    }

    /// First element matching `selector` in document order.
    ///
    /// Matches inside `<template>` content are ignored since that content is
    /// not part of the document. An invalid selector matches nothing.
    pub fn query_selector(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = match Selector::parse(selector) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::debug!(selector, error = %e, "invalid selector, treating as no match");
                return None;
            }
        };

        self.html.select(&selector).find(|el| !is_inert(**el))
    }

    /// All `<iframe>` elements of the document, in document order.
    pub fn iframes(&self) -> Vec<ElementRef<'_>> {
        match Selector::parse("iframe") {
            Ok(selector) => self.html.select(&selector).filter(|el| !is_inert(**el)).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Looks up the content document of an `<iframe>` element.
    pub fn content_document<'a>(&'a self, iframe: ElementRef<'_>) -> FrameAccess<'a> {
        if let Some(srcdoc) = iframe.value().attr("srcdoc") {
            let inline = Self::from_html(Html::parse_document(srcdoc), self.location.clone());
            return FrameAccess::Inline(Box::new(inline));
        }

        let Some(src) = iframe.value().attr("src") else {
            return FrameAccess::Unavailable;
        };

        let attached = self.frames.get(src).or_else(|| {
            let resolved = self.base_uri().join(src).ok()?;
            self.frames.get(resolved.as_str())
        });

        match attached {
            Some(frame) if frame.location.origin() == self.location.origin() => FrameAccess::Attached(frame),
            Some(frame) => FrameAccess::CrossOrigin { origin: frame.location.origin().ascii_serialization() },
            None => FrameAccess::Unavailable,
        }
    }
}

/// Returns the open shadow root of `host`, if it has one.
///
/// The shadow root is the declarative `<template>` child carrying
/// `shadowrootmode="open"` (or the older `shadowroot="open"`). Closed roots
/// are not exposed.
pub fn shadow_root<'a>(host: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let template = host.children().filter_map(ElementRef::wrap).find(|child| {
        let el = child.value();
        el.name() == "template" && (el.attr("shadowrootmode").is_some() || el.attr("shadowroot").is_some())
    })?;

    let mode = template
        .value()
        .attr("shadowrootmode")
        .or_else(|| template.value().attr("shadowroot"))?;

    mode.trim().eq_ignore_ascii_case("open").then_some(template)
}

/// Whether `node` sits inside `<template>` content.
pub fn is_inert(node: NodeRef<'_, Node>) -> bool {
    node.ancestors()
        .any(|ancestor| ancestor.value().as_element().is_some_and(|el| el.name() == "template"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><base href="/docs/"><title>Test</title></head>
        <body>
            <template><div id="main">inert</div></template>
            <div id="main" class="real"><p>Body</p></div>
            <iframe src="/frame.html"></iframe>
            <iframe srcdoc="<p>inline</p>"></iframe>
            <iframe src="https://other.org/x.html"></iframe>
            <iframe></iframe>
        </body>
        </html>
    "#;

    fn page() -> Document {
        Document::parse(PAGE, "https://example.com/index.html").unwrap()
    }

    #[test]
    fn test_invalid_location() {
        let result = Document::parse("<p></p>", "/relative");
        assert!(matches!(result, Err(HarvestError::InvalidUrl(_))));
    }

    #[test]
    fn test_base_uri_from_base_element() {
        assert_eq!(page().base_uri().as_str(), "https://example.com/docs/");
    }

    #[test]
    fn test_base_uri_falls_back_to_location() {
        let doc = Document::parse("<p>x</p>", "https://example.com/a/b?q=1").unwrap();
        assert_eq!(doc.base_uri().as_str(), "https://example.com/a/b?q=1");
    }

    #[test]
    fn test_query_selector_skips_template_content() {
        let doc = page();
        let main = doc.query_selector("#main").unwrap();
        assert_eq!(main.value().attr("class"), Some("real"));
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        assert!(page().query_selector("[[invalid").is_none());
    }

    #[test]
    fn test_body_always_present() {
        let doc = Document::parse("just text", "https://example.com/").unwrap();
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_frame_access() {
        let frame = Document::parse("<p>framed</p>", "https://example.com/frame.html").unwrap();
        let foreign = Document::parse("<p>foreign</p>", "https://other.org/x.html").unwrap();
        let doc = page()
            .with_frame("https://example.com/frame.html", frame)
            .with_frame("https://other.org/x.html", foreign);

        let iframes = doc.iframes();
        assert_eq!(iframes.len(), 4);

        assert!(matches!(doc.content_document(iframes[0]), FrameAccess::Attached(_)));
        assert!(matches!(doc.content_document(iframes[1]), FrameAccess::Inline(_)));
        match doc.content_document(iframes[2]) {
            FrameAccess::CrossOrigin { origin } => assert_eq!(origin, "https://other.org"),
            other => panic!("expected cross-origin frame, got {:?}", other),
        }
        assert!(doc.content_document(iframes[3]).document().is_none());
    }

    #[test]
    fn test_shadow_root_modes() {
        let html = r#"
            <div id="open"><template shadowrootmode="open"><p>in shadow</p></template><span>light</span></div>
            <div id="closed"><template shadowrootmode="closed"><p>hidden</p></template></div>
            <div id="legacy"><template shadowroot="open"><p>old</p></template></div>
            <div id="plain"><template><p>plain</p></template></div>
        "#;
        let doc = Document::parse(html, "https://example.com/").unwrap();

        let root = shadow_root(doc.query_selector("#open").unwrap()).unwrap();
        assert_eq!(root.value().name(), "template");
        assert!(shadow_root(doc.query_selector("#closed").unwrap()).is_none());
        assert!(shadow_root(doc.query_selector("#legacy").unwrap()).is_some());
        assert!(shadow_root(doc.query_selector("#plain").unwrap()).is_none());
    }
}
