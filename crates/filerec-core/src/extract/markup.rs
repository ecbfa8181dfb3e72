//! Text recovery from markup: HTML, XML and JSON

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::OnceLock;

static TAG: OnceLock<Regex> = OnceLock::new();
static SCRIPT_OR_STYLE: OnceLock<Regex> = OnceLock::new();
static COMMENT: OnceLock<Regex> = OnceLock::new();
static NUMERIC_ENTITY: OnceLock<Regex> = OnceLock::new();
static WHITESPACE: OnceLock<Regex> = OnceLock::new();

fn tag_regex() -> &'static Regex {
    TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"))
}

fn script_or_style_regex() -> &'static Regex {
    SCRIPT_OR_STYLE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
            .expect("script pattern is valid")
    })
}

fn comment_regex() -> &'static Regex {
    COMMENT.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"))
}

fn numeric_entity_regex() -> &'static Regex {
    NUMERIC_ENTITY
        .get_or_init(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("entity pattern is valid"))
}

fn whitespace_regex() -> &'static Regex {
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Collapse whitespace runs into single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_regex().replace_all(text, " ").trim().to_string()
}

/// Decode the common named entities and numeric character references
pub fn decode_entities(text: &str) -> String {
    let numeric = numeric_entity_regex().replace_all(text, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Remove tags, comments and script/style bodies; tags become spaces so
/// adjacent block elements do not fuse words together
pub fn strip_tags(html: &str) -> String {
    let without_comments = comment_regex().replace_all(html, " ");
    let without_scripts = script_or_style_regex().replace_all(&without_comments, " ");
    tag_regex().replace_all(&without_scripts, " ").into_owned()
}

/// Plain text of an HTML document
pub fn html_to_text(html: &str) -> String {
    normalize_whitespace(&decode_entities(&strip_tags(html)))
}

/// Concatenated text content of an XML document
///
/// Text nodes are joined directly; a space is inserted at the end of any
/// element named in `breaks` (or at every element end when `breaks` is
/// empty). Returns `None` when the document is not well formed.
pub fn xml_text(xml: &str, breaks: &[&[u8]]) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => out.push_str(&e.unescape().unwrap_or_default()),
            Ok(Event::CData(e)) => out.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Ok(Event::End(e)) => {
                if breaks.is_empty() || breaks.contains(&e.name().as_ref()) {
                    out.push(' ');
                }
            }
            Ok(Event::Empty(e)) => {
                if breaks.contains(&e.name().as_ref()) {
                    out.push(' ');
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, position = reader.buffer_position(), "Malformed XML");
                return None;
            }
            _ => {}
        }
        buf.clear();
    }

    Some(normalize_whitespace(&out))
}

/// Plain text of a generic XML document, falling back to tag stripping when
/// the document does not parse
pub fn xml_to_text(xml: &str) -> String {
    xml_text(xml, &[]).unwrap_or_else(|| html_to_text(xml))
}

/// Space-joined scalar values of a JSON document
///
/// Arrays and objects are flattened in document order; anything that is not
/// valid JSON yields empty text.
pub fn json_to_text(bytes: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) else {
        return String::new();
    };
    let mut parts = Vec::new();
    flatten_json(&value, &mut parts);
    parts.join(" ")
}

fn flatten_json(value: &serde_json::Value, parts: &mut Vec<String>) {
    use serde_json::Value;
    match value {
        Value::Null => {}
        Value::Bool(b) => parts.push(b.to_string()),
        Value::Number(n) => parts.push(n.to_string()),
        Value::String(s) => parts.push(s.clone()),
        Value::Array(values) => values.iter().for_each(|v| flatten_json(v, parts)),
        Value::Object(map) => map.values().for_each(|v| flatten_json(v, parts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let html = "<html><head><style>p { color: red }</style><script>var x = 1;</script></head>\
                    <body><h1>Quarterly&nbsp;Report</h1><p>Sales&amp;Marketing</p><!-- hidden --></body></html>";
        assert_eq!(html_to_text(html), "Quarterly Report Sales&Marketing");
    }

    #[test]
    fn test_block_tags_separate_words() {
        assert_eq!(html_to_text("<p>one</p><p>two</p>"), "one two");
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_entities("caf&#233; &#x263A;"), "café ☺");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_xml_text_with_breaks() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Hel</w:t></w:r><w:r><w:t>lo</w:t></w:r></w:p><w:p><w:r><w:t>world</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(xml_text(xml, &[b"w:p"]).unwrap(), "Hello world");
    }

    #[test]
    fn test_xml_text_rejects_malformed() {
        assert!(xml_text("<a><b></a>", &[]).is_none());
    }

    #[test]
    fn test_xml_to_text_generic() {
        let xml = r#"<?xml version="1.0"?><notes><note>Buy &amp; sell</note><note><![CDATA[x < y]]></note></notes>"#;
        assert_eq!(xml_to_text(xml), "Buy & sell x < y");
    }

    #[test]
    fn test_json_array_join() {
        let json = br#"["alpha", "beta", 3, true, null, ["nested"], {"k": "value"}]"#;
        assert_eq!(json_to_text(json), "alpha beta 3 true nested value");
    }

    #[test]
    fn test_invalid_json_is_empty() {
        assert_eq!(json_to_text(b"{not json"), "");
    }
}
