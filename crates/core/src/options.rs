//! Extraction options and positional requests.
//!
//! [`ExtractionOptions`] carries the behavioral switches of one extraction.
//! Options deserialize from a partial JSON object: keys that are present
//! override the defaults, missing keys keep them and unknown keys are ignored.
//!
//! # Example
//!
//! ```rust
//! use harvest_core::ExtractionOptions;
//!
//! let options = ExtractionOptions::builder()
//!     .include_shadow_dom(true)
//!     .max_links(50)
//!     .build();
//! assert!(options.dedupe_links);
//!
//! let from_json = ExtractionOptions::from_json(r#"{"includeShadowDom": true, "maxLinks": 50}"#).unwrap();
//! assert_eq!(options, from_json);
//! ```

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Default cap on recorded links.
pub const DEFAULT_MAX_LINKS: usize = 500;

/// Text collection when `within_only` is set but no scope element exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingScope {
    /// Nothing is in scope, so the text comes out empty.
    #[default]
    Empty,
    /// The whole document counts as in scope.
    WholeDocument,
}

/// Behavioral options for one extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionOptions {
    /// Collect text only from inside the scope element (default: true).
    pub within_only: bool,

    /// Walk open shadow roots (default: false).
    pub include_shadow_dom: bool,

    /// Walk same-origin iframe bodies after the main document (default: false).
    pub include_iframes: bool,

    /// Drop repeated `(href, text)` pairs (default: true).
    pub dedupe_links: bool,

    /// Maximum number of links; the walk stops once reached (default: 500).
    pub max_links: usize,

    /// Resolve relative hrefs against the document base URI (default: false).
    pub use_base_element: bool,

    /// Keep `//host/path` hrefs (default: false).
    pub allow_protocol_relative: bool,

    /// What `within_only` means without a scope element (default: empty).
    pub missing_scope: MissingScope,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            within_only: true,
            include_shadow_dom: false,
            include_iframes: false,
            dedupe_links: true,
            max_links: DEFAULT_MAX_LINKS,
            use_base_element: false,
            allow_protocol_relative: false,
            missing_scope: MissingScope::Empty,
        }
    }
}

impl ExtractionOptions {
    /// Creates a new builder for ExtractionOptions.
    pub fn builder() -> ExtractionOptionsBuilder {
        ExtractionOptionsBuilder::new()
    }

    /// The legacy fixed configuration: no shadow roots or frames, no dedupe
    /// and no cap.
    pub fn legacy() -> Self {
        Self { dedupe_links: false, max_links: usize::MAX, ..Self::default() }
    }

    /// Overlays a partial JSON object onto the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether nodes count as in scope when no scope element exists.
    pub fn collects_without_scope(&self) -> bool {
        !self.within_only || self.missing_scope == MissingScope::WholeDocument
    }
}

/// Builder for ExtractionOptions.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOptionsBuilder {
    options: ExtractionOptions,
}

impl ExtractionOptionsBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn within_only(mut self, value: bool) -> Self {
        self.options.within_only = value;
        self
    }

    pub fn include_shadow_dom(mut self, value: bool) -> Self {
        self.options.include_shadow_dom = value;
        self
    }

    pub fn include_iframes(mut self, value: bool) -> Self {
        self.options.include_iframes = value;
        self
    }

    pub fn dedupe_links(mut self, value: bool) -> Self {
        self.options.dedupe_links = value;
        self
    }

    pub fn max_links(mut self, value: usize) -> Self {
        self.options.max_links = value;
        self
    }

    pub fn use_base_element(mut self, value: bool) -> Self {
        self.options.use_base_element = value;
        self
    }

    pub fn allow_protocol_relative(mut self, value: bool) -> Self {
        self.options.allow_protocol_relative = value;
        self
    }

    pub fn missing_scope(mut self, value: MissingScope) -> Self {
        self.options.missing_scope = value;
        self
    }

    /// Builds the options.
    pub fn build(self) -> ExtractionOptions {
        self.options
    }
}

/// The positional arguments of one extraction call:
/// `[pattern, scopeSelector, options?]`.
///
/// Empty strings, `null` and non-string values for the first two positions
/// mean "absent".
///
/// ```rust
/// use harvest_core::ExtractionRequest;
///
/// let request = ExtractionRequest::from_json(r##"["^/", "#main", {"maxLinks": 10}]"##).unwrap();
/// assert_eq!(request.pattern.as_deref(), Some("^/"));
/// assert_eq!(request.scope.as_deref(), Some("#main"));
/// assert_eq!(request.options.max_links, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub pattern: Option<String>,
    pub scope: Option<String>,
    pub options: ExtractionOptions,
}

impl ExtractionRequest {
    pub fn new(pattern: Option<&str>, scope: Option<&str>, options: ExtractionOptions) -> Self {
        Self { pattern: non_empty(pattern), scope: non_empty(scope), options }
    }

    /// Decodes a JSON argument array.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn string_argument(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for ExtractionRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let arguments = Vec::<Value>::deserialize(deserializer)?;
        if arguments.len() > 3 {
            return Err(D::Error::invalid_length(arguments.len(), &"at most 3 positional arguments"));
        }

        let mut arguments = arguments.into_iter();
        let pattern = string_argument(arguments.next());
        let scope = string_argument(arguments.next());
        let options = match arguments.next() {
            None | Some(Value::Null) => ExtractionOptions::default(),
            Some(value) => serde_json::from_value(value).map_err(D::Error::custom)?,
        };

        Ok(Self { pattern, scope, options })
    }
}
