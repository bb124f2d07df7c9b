//! Extraction output: the flat text and the ordered link list.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Output format options for an [`ExtractionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The whole result as JSON (`{"text": ..., "links": [...]}`).
    Json,
    /// Only the collapsed text.
    PlainText,
    /// One link per line, href and text separated by a tab.
    Links,
}

/// One recorded link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The resolved href.
    pub href: String,
    /// Collapsed inner text of the anchor.
    pub text: String,
}

impl LinkRecord {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self { href: href.into(), text: text.into() }
    }
}

/// The result of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Collapsed, trimmed in-scope text.
    pub text: String,
    /// Links in first-encounter order.
    pub links: Vec<LinkRecord>,
}

impl ExtractionResult {
    /// Converts the result to the specified format.
    pub fn to_format(&self, format: OutputFormat, pretty: bool) -> Result<String> {
        match format {
            OutputFormat::Json => self.to_json(pretty),
            OutputFormat::PlainText => Ok(self.text.clone()),
            OutputFormat::Links => Ok(self.links_as_lines()),
        }
    }

    /// Serializes the result as JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty { serde_json::to_string_pretty(self)? } else { serde_json::to_string(self)? };
        Ok(json)
    }

    /// Links as `href<TAB>text` lines.
    pub fn links_as_lines(&self) -> String {
        self.links
            .iter()
            .map(|link| format!("{}\t{}\n", link.href, link.text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        ExtractionResult {
            text: "Hello world Go".to_string(),
            links: vec![LinkRecord::new("https://example.com/x", "Go"), LinkRecord::new("/y", "")],
        }
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json(false).unwrap()).unwrap();
        assert_eq!(json["text"], "Hello world Go");
        assert_eq!(json["links"][0]["href"], "https://example.com/x");
        assert_eq!(json["links"][0]["text"], "Go");
        assert_eq!(json["links"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_pretty_json() {
        let pretty = sample().to_format(OutputFormat::Json, true).unwrap();
        assert!(pretty.contains("\n  \"text\""));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(sample().to_format(OutputFormat::PlainText, false).unwrap(), "Hello world Go");
    }

    #[test]
    fn test_link_lines() {
        assert_eq!(sample().links_as_lines(), "https://example.com/x\tGo\n/y\t\n");
    }

    #[test]
    fn test_default_is_empty() {
        let result = ExtractionResult::default();
        assert!(result.text.is_empty());
        assert!(result.links.is_empty());
    }
}
