//! Error types for harvest operations.
//!
//! Extraction itself never fails: bad patterns, missing scope elements,
//! unresolvable links and inaccessible frames all degrade into a partial
//! result. [`HarvestError`] covers everything around the extraction routine:
//! building documents, fetching pages, reading files and decoding option
//! or request JSON.
//!
//! # Example
//!
//! ```rust
//! use harvest_core::{Document, HarvestError};
//!
//! match Document::parse("<p>Hi</p>", "not a url") {
//!     Err(HarvestError::InvalidUrl(msg)) => println!("bad location: {}", msg),
//!     Err(e) => println!("Error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harvest operations.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a document location or fetch target cannot be parsed
    /// as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// JSON encoding or decoding failed: options, positional requests or
    /// serialized results.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File and stream I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for HarvestError.
pub type Result<T> = std::result::Result<T, HarvestError>;
