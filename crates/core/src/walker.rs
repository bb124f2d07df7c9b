//! Depth-first document walking.
//!
//! The walker enumerates nodes in document order from a traversal root and
//! hands each one to a [`Visitor`]. The visitor decides two things:
//!
//! - [`Visitor::accept`]: whether a node takes part at all. A rejected node is
//!   dropped together with its whole subtree.
//! - [`Visitor::visit`]: what to do after seeing an accepted node: descend into
//!   its children, skip them, or stop the walk.
//!
//! [`Visitor::leave`] is called once a visited node's subtree is done, which
//! lets visitors react to element boundaries.
//!
//! The same walker drives document bodies, shadow roots and frame bodies. It
//! is iterative, so deeply nested documents do not grow the call stack.

use std::ops::ControlFlow;

use ego_tree::NodeRef;
use scraper::Node;

/// What the walker does after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Continue into the node's children.
    Descend,
    /// Continue with the node's next sibling.
    SkipChildren,
    /// Stop walking the current root.
    Halt,
}

/// Callbacks driven by [`walk`] and [`walk_children`].
pub trait Visitor {
    /// Whether `node` and its subtree are walked. Defaults to accepting all.
    fn accept(&self, node: NodeRef<'_, Node>) -> bool {
        let _ = node;
        true
    }

    /// Called once per accepted node, parents before children.
    fn visit(&mut self, node: NodeRef<'_, Node>) -> Visit;

    /// Called after the subtree of a visited node has been walked.
    fn leave(&mut self, node: NodeRef<'_, Node>) {
        let _ = node;
    }
}

enum Step<'a> {
    Enter(NodeRef<'a, Node>),
    Leave(NodeRef<'a, Node>),
}

/// Walks `root` and its descendants.
///
/// Returns `ControlFlow::Break` when the visitor halted the walk.
pub fn walk<V: Visitor + ?Sized>(root: NodeRef<'_, Node>, visitor: &mut V) -> ControlFlow<()> {
    drive(vec![Step::Enter(root)], visitor)
}

/// Walks the descendants of `parent`, without visiting `parent` itself.
///
/// This is how fragment-like roots are walked: a shadow root's content hangs
/// off its `<template>`, which is not part of the tree being walked.
pub fn walk_children<V: Visitor + ?Sized>(parent: NodeRef<'_, Node>, visitor: &mut V) -> ControlFlow<()> {
    let mut stack: Vec<_> = parent.children().map(Step::Enter).collect();
    stack.reverse();
    drive(stack, visitor)
}

fn drive<V: Visitor + ?Sized>(mut stack: Vec<Step<'_>>, visitor: &mut V) -> ControlFlow<()> {
    while let Some(step) = stack.pop() {
        let node = match step {
            Step::Leave(node) => {
                visitor.leave(node);
                continue;
            }
            Step::Enter(node) => node,
        };

        if !visitor.accept(node) {
            continue;
        }

        match visitor.visit(node) {
            Visit::Halt => return ControlFlow::Break(()),
            Visit::SkipChildren => visitor.leave(node),
            Visit::Descend => {
                stack.push(Step::Leave(node));
                let start = stack.len();
                stack.extend(node.children().map(Step::Enter));
                stack[start..].reverse();
            }
        }
    }

    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    /// Records element names and trimmed text in visiting order.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
        reject: Vec<&'static str>,
        skip: Vec<&'static str>,
        halt_at: Option<&'static str>,
    }

    impl Visitor for Recorder {
        fn accept(&self, node: NodeRef<'_, Node>) -> bool {
            node.value()
                .as_element()
                .is_none_or(|el| !self.reject.iter().any(|name| *name == el.name()))
        }

        fn visit(&mut self, node: NodeRef<'_, Node>) -> Visit {
            match node.value() {
                Node::Element(el) => {
                    self.seen.push(el.name().to_string());
                    if self.halt_at == Some(el.name()) {
                        return Visit::Halt;
                    }
                    if self.skip.iter().any(|name| *name == el.name()) {
                        return Visit::SkipChildren;
                    }
                }
                Node::Text(text) if !text.trim().is_empty() => self.seen.push(format!("'{}'", text.trim())),
                _ => {}
            }
            Visit::Descend
        }
    }

    /// Records element boundaries as `<name>` and `</name>`.
    #[derive(Default)]
    struct Boundaries {
        seen: Vec<String>,
    }

    impl Visitor for Boundaries {
        fn visit(&mut self, node: NodeRef<'_, Node>) -> Visit {
            match node.value().as_element() {
                Some(el) if el.name() == "a" => {
                    self.seen.push("<a>".to_string());
                    Visit::SkipChildren
                }
                Some(el) => {
                    self.seen.push(format!("<{}>", el.name()));
                    Visit::Descend
                }
                None => Visit::Descend,
            }
        }

        fn leave(&mut self, node: NodeRef<'_, Node>) {
            if let Some(el) = node.value().as_element() {
                self.seen.push(format!("</{}>", el.name()));
            }
        }
    }

    fn body(html: &Html) -> NodeRef<'_, Node> {
        let selector = scraper::Selector::parse("body").unwrap();
        *html.select(&selector).next().unwrap()
    }

    #[test]
    fn test_document_order() {
        let html = Html::parse_document("<div><p>a</p><span>b</span></div><em>c</em>");
        let mut recorder = Recorder::default();

        assert!(walk(body(&html), &mut recorder).is_continue());
        assert_eq!(recorder.seen, ["body", "div", "p", "'a'", "span", "'b'", "em", "'c'"]);
    }

    #[test]
    fn test_rejected_subtree_is_dropped() {
        let html = Html::parse_document("<div>a<script>var x;</script><p>b</p></div>");
        let mut recorder = Recorder { reject: vec!["script"], ..Default::default() };

        assert!(walk(body(&html), &mut recorder).is_continue());
        assert_eq!(recorder.seen, ["body", "div", "'a'", "p", "'b'"]);
    }

    #[test]
    fn test_skip_children() {
        let html = Html::parse_document("<a>inside</a><p>after</p>");
        let mut recorder = Recorder { skip: vec!["a"], ..Default::default() };

        assert!(walk(body(&html), &mut recorder).is_continue());
        assert_eq!(recorder.seen, ["body", "a", "p", "'after'"]);
    }

    #[test]
    fn test_halt_stops_walk() {
        let html = Html::parse_document("<p>one</p><hr><p>two</p>");
        let mut recorder = Recorder { halt_at: Some("hr"), ..Default::default() };

        assert!(walk(body(&html), &mut recorder).is_break());
        assert_eq!(recorder.seen, ["body", "p", "'one'", "hr"]);
    }

    #[test]
    fn test_walk_children_skips_parent() {
        let html = Html::parse_document("<section><p>x</p></section>");
        let selector = scraper::Selector::parse("section").unwrap();
        let section = html.select(&selector).next().unwrap();
        let mut recorder = Recorder::default();

        assert!(walk_children(*section, &mut recorder).is_continue());
        assert_eq!(recorder.seen, ["p", "'x'"]);
    }

    #[test]
    fn test_leave_after_subtree() {
        let html = Html::parse_document("<div><p>x</p><a><b>y</b></a></div>");
        let mut boundaries = Boundaries::default();

        assert!(walk(body(&html), &mut boundaries).is_continue());
        assert_eq!(
            boundaries.seen,
            ["<body>", "<div>", "<p>", "</p>", "<a>", "</a>", "</div>", "</body>"]
        );
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 5_000;
        let markup = format!("{}deep{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let html = Html::parse_document(&markup);
        let mut recorder = Recorder::default();

        assert!(walk(body(&html), &mut recorder).is_continue());
        assert_eq!(recorder.seen.last().map(String::as_str), Some("'deep'"));
    }
}
