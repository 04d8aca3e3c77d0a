// ABOUTME: Byte-span locators for the few head-level tags the tools care about.
// ABOUTME: Finds the <head> open tag and <meta charset> declarations without a full parse.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

// `<head>` but never `<header>`
static HEAD_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").unwrap());
static UTF8_CHARSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<meta\s+charset\s*=\s*["']?utf-8["']?\s*/?>"#).unwrap());
static ANY_CHARSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([A-Za-z0-9_:.-]+)["']?[^>]*>"#).unwrap()
});
static DOCTYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^<!doctype\s+html\s*>").unwrap());

/// Span of the first `<head ...>` open tag.
pub fn head_open(markup: &str) -> Option<Range<usize>> {
    HEAD_OPEN_RE.find(markup).map(|m| m.range())
}

/// Span of the first `<meta charset="utf-8">` tag (quotes optional, any case).
pub fn utf8_charset(markup: &str) -> Option<Range<usize>> {
    UTF8_CHARSET_RE.find(markup).map(|m| m.range())
}

/// Value of the first charset declared by a `<meta>` tag, lowercased.
pub fn declared_charset(markup: &str) -> Option<String> {
    ANY_CHARSET_RE
        .captures(markup)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// True when the document opens with an HTML5 doctype.
pub fn has_doctype(markup: &str) -> bool {
    DOCTYPE_RE.is_match(markup.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_open_ignores_header() {
        let html = "<html><header>x</header><head lang=\"en\"><title>t</title></head>";
        let range = head_open(html).unwrap();
        assert_eq!(&html[range], "<head lang=\"en\">");
    }

    #[test]
    fn test_utf8_charset_variants() {
        assert!(utf8_charset(r#"<meta charset="UTF-8">"#).is_some());
        assert!(utf8_charset("<meta charset=utf-8 />").is_some());
        assert!(utf8_charset(r#"<meta charset='utf-8'/>"#).is_some());
        assert!(utf8_charset(r#"<meta charset="iso-8859-1">"#).is_none());
    }

    #[test]
    fn test_declared_charset() {
        assert_eq!(
            declared_charset(r#"<meta charset="ISO-8859-1">"#).as_deref(),
            Some("iso-8859-1")
        );
        assert_eq!(declared_charset("<meta name=\"x\">"), None);
    }

    #[test]
    fn test_has_doctype() {
        assert!(has_doctype("  <!DOCTYPE html>\n<html>"));
        assert!(has_doctype("<!doctype html><html>"));
        assert!(!has_doctype("<html>"));
    }
}
