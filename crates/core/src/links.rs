//! Link candidates: filtering, resolution and recording.
//!
//! Every anchor the walker meets goes through [`LinkFilter::evaluate`], which
//! either yields the resolved href or a [`Rejection`] saying why the anchor is
//! not a candidate. Accepted candidates are recorded in a [`LinkSet`], which
//! owns ordering, deduplication and the link cap for one extraction.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use url::Url;

use crate::document::Document;
use crate::result::LinkRecord;

/// Schemes that never produce a link.
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:"];

/// Why an anchor did not produce a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "camelCase")]
pub enum Rejection {
    /// No `href` attribute, or an empty one.
    MissingHref,
    /// A `//host/path` href while protocol-relative links are disallowed.
    ProtocolRelative,
    /// A `javascript:`, `mailto:` or `tel:` href.
    BlockedScheme(&'static str),
    /// The href does not match the link pattern.
    PatternMismatch,
    /// The href cannot be resolved against the base URL.
    Unresolvable(String),
    /// The same `(href, text)` pair was already recorded.
    Duplicate,
    /// The link cap was already reached.
    ///
    /// Returned by [`LinkSet::insert`]; an extraction halts at the cap, so its
    /// reports never contain it.
    LimitReached,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingHref => write!(f, "missing href"),
            Rejection::ProtocolRelative => write!(f, "protocol-relative href not allowed"),
            Rejection::BlockedScheme(scheme) => write!(f, "blocked scheme {}", scheme),
            Rejection::PatternMismatch => write!(f, "href does not match pattern"),
            Rejection::Unresolvable(reason) => write!(f, "unresolvable href: {}", reason),
            Rejection::Duplicate => write!(f, "duplicate link"),
            Rejection::LimitReached => write!(f, "link limit reached"),
        }
    }
}

/// The outcome for one anchor element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum LinkDecision {
    Accepted(LinkRecord),
    Rejected {
        #[serde(skip_serializing_if = "Option::is_none")]
        href: Option<String>,
        #[serde(flatten)]
        reason: Rejection,
    },
}

impl LinkDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, LinkDecision::Accepted(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            LinkDecision::Accepted(_) => None,
            LinkDecision::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// The base relative hrefs are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    /// Full URL resolution against the document base URI.
    Element(Url),
    /// `protocol://host` of the location; only root-relative paths are
    /// prefixed with it.
    Origin { scheme: String, origin: String },
}

impl Base {
    /// Computes the base for `doc`.
    pub fn for_document(doc: &Document, use_base_element: bool) -> Self {
        if use_base_element {
            return Base::Element(doc.base_uri());
        }

        let location = doc.location();
        let host = match (location.host_str(), location.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        Base::Origin { scheme: location.scheme().to_string(), origin: format!("{}://{}", location.scheme(), host) }
    }

    /// Resolves a raw href that already passed filtering.
    pub fn resolve(&self, href: &str) -> Result<String, Rejection> {
        match self {
            Base::Element(base) => base
                .join(href)
                .map(String::from)
                .map_err(|e| Rejection::Unresolvable(e.to_string())),
            Base::Origin { scheme, .. } if href.starts_with("//") => Ok(format!("{}:{}", scheme, href)),
            Base::Origin { origin, .. } if href.starts_with('/') => Ok(format!("{}{}", origin, href)),
            Base::Origin { .. } => Ok(href.to_string()),
        }
    }

    /// The base as a string, as used for prefixing.
    pub fn as_str(&self) -> &str {
        match self {
            Base::Element(url) => url.as_str(),
            Base::Origin { origin, .. } => origin,
        }
    }
}

/// A compiled link pattern.
///
/// Patterns are written in the ECMAScript dialect. Most compile with `regex`;
/// lookaround and backreferences need the backtracking engine of
/// `fancy_regex`.
#[derive(Debug, Clone)]
pub enum LinkPattern {
    Plain(regex::Regex),
    Backtracking(fancy_regex::Regex),
}

impl LinkPattern {
    /// Search semantics: the pattern may match anywhere in `href`.
    ///
    /// A backtracking pattern that fails at match time (backtrack limit)
    /// accepts the href.
    pub fn is_match(&self, href: &str) -> bool {
        match self {
            LinkPattern::Plain(regex) => regex.is_match(href),
            LinkPattern::Backtracking(regex) => regex.is_match(href).unwrap_or_else(|e| {
                tracing::warn!(href, error = %e, "link pattern failed to run, accepting link");
                true
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinkPattern::Plain(regex) => regex.as_str(),
            LinkPattern::Backtracking(regex) => regex.as_str(),
        }
    }
}

/// Compiles a link pattern.
///
/// An empty or absent pattern means "accept all". So does a pattern that
/// neither engine can compile; the failure is logged at `warn`.
pub fn compile_pattern(pattern: Option<&str>) -> Option<LinkPattern> {
    let pattern = pattern.filter(|p| !p.is_empty())?;

    if let Ok(regex) = regex::Regex::new(pattern) {
        return Some(LinkPattern::Plain(regex));
    }

    match fancy_regex::Regex::new(pattern) {
        Ok(regex) => Some(LinkPattern::Backtracking(regex)),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid link pattern, accepting all links");
            None
        }
    }
}

/// Per-extraction link filter: scheme rules, pattern and base.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    pattern: Option<LinkPattern>,
    allow_protocol_relative: bool,
    base: Base,
}

impl LinkFilter {
    pub fn new(pattern: Option<LinkPattern>, allow_protocol_relative: bool, base: Base) -> Self {
        Self { pattern, allow_protocol_relative, base }
    }

    pub fn base(&self) -> &Base {
        &self.base
    }

    /// Runs the candidate checks on a raw `href` attribute and resolves it.
    ///
    /// The pattern is matched against the raw attribute, not the resolved URL.
    pub fn evaluate(&self, href: Option<&str>) -> Result<String, Rejection> {
        let href = href.filter(|h| !h.is_empty()).ok_or(Rejection::MissingHref)?;

        if !self.allow_protocol_relative && href.starts_with("//") {
            return Err(Rejection::ProtocolRelative);
        }

        let lowered = href.trim().to_lowercase();
        if let Some(scheme) = BLOCKED_SCHEMES.iter().copied().find(|scheme| lowered.starts_with(scheme)) {
            return Err(Rejection::BlockedScheme(scheme));
        }

        if let Some(pattern) = &self.pattern
            && !pattern.is_match(href)
        {
            return Err(Rejection::PatternMismatch);
        }

        self.base.resolve(href)
    }
}

/// Ordered, optionally deduplicated, capped link list for one extraction.
#[derive(Debug, Clone)]
pub struct LinkSet {
    links: Vec<LinkRecord>,
    seen: HashSet<(String, String)>,
    dedupe: bool,
    max_links: usize,
}

impl LinkSet {
    pub fn new(dedupe: bool, max_links: usize) -> Self {
        Self { links: Vec::new(), seen: HashSet::new(), dedupe, max_links }
    }

    /// Appends a record unless it is a duplicate or the cap is reached.
    pub fn insert(&mut self, record: LinkRecord) -> Result<(), Rejection> {
        if self.is_full() {
            return Err(Rejection::LimitReached);
        }

        if self.dedupe && !self.seen.insert((record.href.clone(), record.text.clone())) {
            return Err(Rejection::Duplicate);
        }

        self.links.push(record);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.links.len() >= self.max_links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn into_links(self) -> Vec<LinkRecord> {
        self.links
    }
}
