//! The extraction routine.
//!
//! One pass over the document collects both outputs:
//!
//! 1. Options are resolved: the link pattern is compiled, the base URL is
//!    computed and the scope selector is looked up.
//! 2. The document body is walked. Anchors go through the link filter, text
//!    nodes in scope are appended to the text buffer. Open shadow roots are
//!    walked in place when enabled.
//! 3. Same-origin iframe bodies are walked afterwards when enabled.
//! 4. The text buffer is collapsed into the final text.
//!
//! The walk stops as soon as the link cap is reached.
//!
//! # Example
//!
//! ```rust
//! use harvest_core::{Document, ExtractionOptions, extract};
//!
//! let doc = Document::parse(
//!     r#"<div id="main"><p>Hello  world</p><a href="/x">Go</a></div><script>var x=1;</script>"#,
//!     "https://example.com/page",
//! ).unwrap();
//!
//! let result = extract(&doc, Some("^/"), Some("#main"), &ExtractionOptions::default());
//! assert_eq!(result.text, "Hello world Go");
//! assert_eq!(result.links[0].href, "https://example.com/x");
//! assert_eq!(result.links[0].text, "Go");
//! ```

use std::ops::ControlFlow;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Node};
use serde::Serialize;

use crate::document::{Document, FrameAccess, shadow_root};
use crate::links::{Base, LinkDecision, LinkFilter, LinkSet, compile_pattern};
use crate::options::{ExtractionOptions, ExtractionRequest};
use crate::result::{ExtractionResult, LinkRecord};
use crate::text::{TextBuffer, inner_text, is_block_tag, is_html_element, is_skipped_tag};
use crate::walker::{Visit, Visitor, walk, walk_children};

/// An iframe that was not walked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFrame {
    /// The iframe's `src` attribute, if any.
    pub src: Option<String>,
    /// The frame's origin when it was denied for being cross-origin.
    pub origin: Option<String>,
}

/// An extraction result together with the decision taken for every anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub result: ExtractionResult,
    /// One entry per anchor visited, in traversal order.
    pub decisions: Vec<LinkDecision>,
    /// Frames that were inaccessible.
    pub skipped_frames: Vec<SkippedFrame>,
    /// Whether the link cap was reached. The walk stops right there, so any
    /// content after the link that filled the cap (including iframes) was not
    /// visited. Also set when that link was the last one in the document.
    pub truncated: bool,
}

/// Extracts text and links as described by a positional request.
pub fn extract_content(doc: &Document, request: &ExtractionRequest) -> ExtractionResult {
    extract(doc, request.pattern.as_deref(), request.scope.as_deref(), &request.options)
}

/// Extracts text and links from `doc`.
///
/// `pattern` filters candidate hrefs (absent, empty or invalid means no
/// filter); `scope` selects the element that delimits collected text.
pub fn extract(doc: &Document, pattern: Option<&str>, scope: Option<&str>, options: &ExtractionOptions) -> ExtractionResult {
    Extractor::new(doc, pattern, scope, options, false).run(doc).result
}

/// Like [`extract`], also reporting why each anchor was kept or dropped.
pub fn extract_with_report(
    doc: &Document, pattern: Option<&str>, scope: Option<&str>, options: &ExtractionOptions,
) -> ExtractionReport {
    Extractor::new(doc, pattern, scope, options, true).run(doc)
}

/// Extraction with the fixed legacy configuration.
///
/// See [`ExtractionOptions::legacy`].
pub fn extract_legacy(doc: &Document, pattern: Option<&str>, scope: Option<&str>) -> ExtractionResult {
    extract(doc, pattern, scope, &ExtractionOptions::legacy())
}

/// How scope is decided for nodes under the root being walked.
#[derive(Debug, Clone, Copy)]
enum RootContext {
    /// The main document body: containment in the scope element.
    Document,
    /// A shadow root: fixed to whether the host is in scope.
    Shadow { host_in_scope: bool },
    /// An iframe body: the scope element lives in another tree.
    Frame,
}

struct Extractor<'o> {
    options: &'o ExtractionOptions,
    filter: LinkFilter,
    scope: Option<NodeId>,
    contexts: Vec<RootContext>,
    text: TextBuffer,
    links: LinkSet,
    decisions: Option<Vec<LinkDecision>>,
    skipped_frames: Vec<SkippedFrame>,
}

impl<'o> Extractor<'o> {
    fn new(
        doc: &Document, pattern: Option<&str>, scope: Option<&str>, options: &'o ExtractionOptions, report: bool,
    ) -> Self {
        let filter = LinkFilter::new(
            compile_pattern(pattern),
            options.allow_protocol_relative,
            Base::for_document(doc, options.use_base_element),
        );

        let scope = scope
            .filter(|selector| !selector.trim().is_empty())
            .and_then(|selector| doc.query_selector(selector))
            .map(|element| element.id());

        tracing::debug!(
            base = filter.base().as_str(),
            scoped = scope.is_some(),
            max_links = options.max_links,
            "starting extraction"
        );

        Self {
            options,
            filter,
            scope,
            contexts: Vec::new(),
            text: TextBuffer::new(),
            links: LinkSet::new(options.dedupe_links, options.max_links),
            decisions: report.then(Vec::new),
            skipped_frames: Vec::new(),
        }
    }

    fn run(mut self, doc: &Document) -> ExtractionReport {
        let mut truncated = false;

        if let Some(body) = doc.body() {
            truncated = self.walk_root(RootContext::Document, |ex| walk(*body, ex)).is_break();
        }

        if self.options.include_iframes && !truncated {
            truncated = self.walk_frames(doc).is_break();
        }

        let result = ExtractionResult { text: self.text.finish(), links: self.links.into_links() };
        tracing::debug!(links = result.links.len(), text_len = result.text.len(), truncated, "extraction finished");

        ExtractionReport {
            result,
            decisions: self.decisions.unwrap_or_default(),
            skipped_frames: self.skipped_frames,
            truncated,
        }
    }

    fn walk_frames(&mut self, doc: &Document) -> ControlFlow<()> {
        for iframe in doc.iframes() {
            if self.links.is_full() {
                return ControlFlow::Break(());
            }

            let src = iframe.value().attr("src").map(str::to_string);
            let access = doc.content_document(iframe);
            let Some(frame) = access.document() else {
                let origin = match &access {
                    FrameAccess::CrossOrigin { origin } => Some(origin.clone()),
                    _ => None,
                };
                tracing::debug!(src = src.as_deref(), origin = origin.as_deref(), "skipping inaccessible frame");
                self.skipped_frames.push(SkippedFrame { src, origin });
                continue;
            };

            if let Some(body) = frame.body() {
                self.walk_root(RootContext::Frame, |ex| walk(*body, ex))?;
            }
        }

        ControlFlow::Continue(())
    }

    fn walk_root(&mut self, context: RootContext, run: impl FnOnce(&mut Self) -> ControlFlow<()>) -> ControlFlow<()> {
        self.contexts.push(context);
        self.text.push_break();
        let flow = run(self);
        self.text.push_break();
        self.contexts.pop();
        flow
    }

    fn in_scope(&self, node: NodeRef<'_, Node>) -> bool {
        let context = self.contexts.last().copied().unwrap_or(RootContext::Document);
        match (context, self.scope) {
            (RootContext::Shadow { host_in_scope }, _) => host_in_scope,
            (_, None) => self.options.collects_without_scope(),
            (RootContext::Document, Some(scope)) => {
                node.id() == scope || node.ancestors().any(|ancestor| ancestor.id() == scope)
            }
            (RootContext::Frame, Some(_)) => false,
        }
    }

    fn record_decision(&mut self, decision: LinkDecision) {
        if let LinkDecision::Rejected { href, reason } = &decision {
            tracing::debug!(href = href.as_deref(), %reason, "anchor rejected");
        }
        if let Some(decisions) = self.decisions.as_mut() {
            decisions.push(decision);
        }
    }

    fn visit_anchor(&mut self, anchor: ElementRef<'_>, in_scope: bool) {
        let raw = anchor.value().attr("href");
        let text = inner_text(anchor);

        let decision = match self.filter.evaluate(raw) {
            Ok(href) => {
                let record = LinkRecord { href, text: text.clone() };
                match self.links.insert(record.clone()) {
                    Ok(()) => LinkDecision::Accepted(record),
                    Err(reason) => LinkDecision::Rejected { href: Some(record.href), reason },
                }
            }
            Err(reason) => LinkDecision::Rejected { href: raw.map(str::to_string), reason },
        };
        self.record_decision(decision);

        if in_scope && !text.is_empty() {
            self.text.push(&text);
        }
    }

    fn visit_shadow_root(&mut self, host: ElementRef<'_>, host_in_scope: bool) -> ControlFlow<()> {
        match shadow_root(host) {
            Some(root) => self.walk_root(RootContext::Shadow { host_in_scope }, |ex| walk_children(*root, ex)),
            None => ControlFlow::Continue(()),
        }
    }
}

impl Visitor for Extractor<'_> {
    fn accept(&self, node: NodeRef<'_, Node>) -> bool {
        match node.value() {
            Node::Element(el) => !is_skipped_tag(el.name()) && el.name() != "template",
            _ => true,
        }
    }

    fn visit(&mut self, node: NodeRef<'_, Node>) -> Visit {
        match node.value() {
            Node::Text(text) => {
                if self.in_scope(node) {
                    self.text.push(text);
                }
                Visit::Descend
            }
            Node::Element(el) => {
                let Some(element) = ElementRef::wrap(node) else {
                    return Visit::Descend;
                };

                if is_block_tag(el.name()) || el.name() == "br" {
                    self.text.push_break();
                }

                let is_anchor = is_html_element(el, "a");
                let next = if is_anchor { Visit::SkipChildren } else { Visit::Descend };
                if is_anchor || self.options.include_shadow_dom {
                    let in_scope = self.in_scope(node);
                    if is_anchor {
                        self.visit_anchor(element, in_scope);
                    }
                    if self.options.include_shadow_dom && self.visit_shadow_root(element, in_scope).is_break() {
                        return Visit::Halt;
                    }
                }

                if self.links.is_full() { Visit::Halt } else { next }
            }
            _ => Visit::Descend,
        }
    }

    fn leave(&mut self, node: NodeRef<'_, Node>) {
        if node.value().as_element().is_some_and(|el| is_block_tag(el.name())) {
            self.text.push_break();
        }
    }
}
