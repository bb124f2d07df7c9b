//! Library API integration tests
use harvest_core::*;

const LOCATION: &str = "https://example.com/section/page.html";

fn doc(markup: &str) -> Document {
    Document::parse(markup, LOCATION).expect("should parse")
}

fn anchors(count: usize) -> String {
    let mut markup = String::from(r#"<div id="main">"#);
    for i in 0..count {
        markup.push_str(&format!(r#"<p><a href="/item/{i}">Item {i}</a></p>"#));
    }
    markup.push_str("</div>");
    markup
}

fn assert_text_collapsed(text: &str) {
    assert_eq!(text, text.trim());
    let mut previous_space = false;
    for c in text.chars() {
        let space = c.is_whitespace() || c == '\u{FEFF}';
        assert!(!(space && previous_space), "consecutive whitespace in {text:?}");
        previous_space = space;
    }
}

#[test]
fn test_reference_scenario() {
    let markup = r#"<div id="main"><p>Hello  world</p><a href="/x">Go</a></div><script>var x=1;</script>"#;
    let result = extract(&doc(markup), Some("^/"), Some("#main"), &ExtractionOptions::default());

    assert_eq!(result.text, "Hello world Go");
    assert_eq!(result.links, vec![LinkRecord::new("https://example.com/x", "Go")]);
}

#[test]
fn test_cap_keeps_first_links() {
    let result = extract(&doc(&anchors(600)), Some("^/item/"), Some("#main"), &ExtractionOptions::default());

    assert_eq!(result.links.len(), DEFAULT_MAX_LINKS);
    assert_eq!(result.links[0].href, "https://example.com/item/0");
    assert_eq!(result.links[499].href, "https://example.com/item/499");
    assert!(result.text.ends_with("Item 499"));
}

#[test]
fn test_legacy_has_no_cap() {
    let result = extract_legacy(&doc(&anchors(600)), None, Some("#main"));
    assert_eq!(result.links.len(), 600);
}

#[test]
fn test_invalid_pattern_accepts_everything() {
    let markup = r#"<a href="/a">a</a><a href="https://other.org/b">b</a><a href="mailto:x@y.z">m</a>"#;
    let invalid = extract(&doc(markup), Some("(unclosed"), None, &ExtractionOptions::default());
    let unfiltered = extract(&doc(markup), None, None, &ExtractionOptions::default());

    assert_eq!(invalid, unfiltered);
    assert_eq!(invalid.links.len(), 2);
}

#[test]
fn test_blocked_schemes_never_appear() {
    let markup = r#"
        <a href="javascript:alert(1)">js</a>
        <a href="  JavaScript:void(0)">js upper</a>
        <a href="mailto:someone@example.com">mail</a>
        <a href="TEL:+123">phone</a>
        <a href="/fine">fine</a>
    "#;
    let result = extract(&doc(markup), None, None, &ExtractionOptions::default());

    assert_eq!(result.links, vec![LinkRecord::new("https://example.com/fine", "fine")]);
}

#[test]
fn test_protocol_relative_toggle() {
    let markup = r#"<a href="//other.com/z">z</a>"#;

    let excluded = extract(&doc(markup), None, None, &ExtractionOptions::default());
    assert!(excluded.links.is_empty());

    let options = ExtractionOptions::builder().allow_protocol_relative(true).build();
    let included = extract(&doc(markup), None, None, &options);
    assert_eq!(included.links, vec![LinkRecord::new("https://other.com/z", "z")]);
}

#[test]
fn test_dedupe_has_no_duplicate_pairs() {
    let markup = r#"
        <a href="/a">A</a><a href="/a">A</a><a href="/a">B</a>
        <a href="/b">A</a><a href="/a">A</a>
    "#;
    let result = extract(&doc(markup), None, None, &ExtractionOptions::default());

    let mut seen = std::collections::HashSet::new();
    assert!(result.links.iter().all(|link| seen.insert(link.clone())));
    assert_eq!(result.links.len(), 3);
}

#[test]
fn test_skipped_content_never_contributes() {
    let markup = r#"<div id="main">
        <script>var secret = "<a href='/script'>x</a>";</script>
        <style>body::after { content: "styled" }</style>
        <noscript><p>no script</p><a href="/noscript">n</a></noscript>
        <p>visible</p>
    </div>"#;
    let result = extract(&doc(markup), None, Some("#main"), &ExtractionOptions::default());

    assert_eq!(result.text, "visible");
    assert!(result.links.is_empty());
}

#[test]
fn test_text_is_collapsed() {
    let markup = "<div id=\"main\">\n\t Lots\u{00A0}\u{00A0} of \u{FEFF}\r\n  <b>spacing</b>  <br>\n here \t</div>";
    let result = extract(&doc(markup), None, Some("#main"), &ExtractionOptions::default());

    assert_eq!(result.text, "Lots of spacing here");
    assert_text_collapsed(&result.text);
}

#[test]
fn test_extraction_is_idempotent() {
    let page = doc(&anchors(20));
    let request = ExtractionRequest::from_json(r##"["item/1", "#main", {"maxLinks": 5}]"##).unwrap();

    let first = extract_content(&page, &request);
    let second = extract_content(&page, &request);

    assert_eq!(first, second);
    assert!(first.links.len() <= 5);
}

#[test]
fn test_result_json_shape() {
    let markup = r#"<div id="main"><a href="/x">Go</a></div>"#;
    let result = extract(&doc(markup), None, Some("#main"), &ExtractionOptions::default());

    let json: serde_json::Value = serde_json::from_str(&result.to_json(false).unwrap()).unwrap();
    assert_eq!(json, serde_json::json!({"text": "Go", "links": [{"href": "https://example.com/x", "text": "Go"}]}));
}

#[test]
fn test_report_serializes_decisions() {
    let markup = r#"<a href="mailto:a@b.c">m</a><a href="/ok">ok</a>"#;
    let report = extract_with_report(&doc(markup), None, None, &ExtractionOptions::default());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["decisions"][0]["decision"], "rejected");
    assert_eq!(json["decisions"][0]["reason"], "blockedScheme");
    assert_eq!(json["decisions"][1]["decision"], "accepted");
    assert_eq!(json["truncated"], false);
}

#[test]
fn test_invalid_location() {
    assert!(matches!(Document::parse("<p>x</p>", "relative/path"), Err(HarvestError::InvalidUrl(_))));
}
