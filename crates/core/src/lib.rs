//! Flat text and outbound link extraction from HTML document trees.
//!
//! Given a loaded [`Document`], a link pattern and a scope selector, one pass
//! over the tree produces an [`ExtractionResult`]: the collapsed text of the
//! scope element and the filtered, resolved, deduplicated list of anchors.
//!
//! ```rust
//! use harvest_core::{Document, ExtractionRequest, extract_content};
//!
//! let doc = Document::parse(
//!     r#"<div id="main"><p>Hello  world</p><a href="/x">Go</a></div>"#,
//!     "https://example.com/",
//! )?;
//! let request = ExtractionRequest::from_json(r##"["^/", "#main"]"##)?;
//!
//! let result = extract_content(&doc, &request);
//! assert_eq!(result.text, "Hello world Go");
//! assert_eq!(result.links[0].href, "https://example.com/x");
//! # Ok::<(), harvest_core::HarvestError>(())
//! ```

pub mod document;
pub mod error;
pub mod extract;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod links;
pub mod options;
pub mod result;
pub mod text;
pub mod walker;

pub use document::{Document, FrameAccess};
pub use error::{HarvestError, Result};
pub use extract::{ExtractionReport, SkippedFrame, extract, extract_content, extract_legacy, extract_with_report};
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, fetch_file, fetch_stdin, fetch_url};
pub use links::{LinkDecision, LinkPattern, Rejection};
pub use options::{DEFAULT_MAX_LINKS, ExtractionOptions, ExtractionOptionsBuilder, ExtractionRequest, MissingScope};
pub use result::{ExtractionResult, LinkRecord, OutputFormat};
