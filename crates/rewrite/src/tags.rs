// ABOUTME: Lightweight start/end tag scanner over raw markup with byte spans.
// ABOUTME: Tracks open elements so each tag knows whether it sits inside a critical (above-the-fold) region.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// comment | <(/?)(name); the rest of the tag is found by `tag_close`
static TAG_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|<(/?)([a-zA-Z][\w:-]*)").unwrap());
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'=<>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>][^\s>]*)))?"#).unwrap()
});
static RAW_TEXT_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(script|style|textarea)").unwrap());

/// Elements whose contents are raw text and never scanned for tags.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// What makes an element a critical region for everything inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalRegions {
    /// Element names that are always critical.
    pub elements: Vec<String>,
    /// Substrings that make an element critical when found in its class or id.
    pub markers: Vec<String>,
}

impl Default for CriticalRegions {
    fn default() -> Self {
        Self {
            elements: vec!["header".to_string()],
            markers: vec!["hero".to_string(), "header".to_string(), "logo".to_string()],
        }
    }
}

impl CriticalRegions {
    fn is_critical(&self, tag: &Tag) -> bool {
        if self.elements.iter().any(|e| e.eq_ignore_ascii_case(&tag.name)) {
            return true;
        }
        ["class", "id"]
            .iter()
            .filter_map(|attr| tag.attr(attr))
            .map(str::to_lowercase)
            .any(|value| self.markers.iter().any(|m| value.contains(&m.to_lowercase())))
    }
}

/// One start or end tag found in the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lowercased element name.
    pub name: String,
    /// Attributes in source order; names lowercased, values unescaped as written.
    pub attrs: Vec<(String, Option<String>)>,
    pub closing: bool,
    pub self_closing: bool,
    /// Span of the whole tag, `<` through `>`.
    pub span: Range<usize>,
    /// Span of the attribute text between the name and `>` (or `/>`).
    pub attr_span: Range<usize>,
    /// True when an enclosing element is a critical region.
    pub in_critical_region: bool,
}

impl Tag {
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }

    /// Value of an attribute; a bare attribute yields `""`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    /// Byte span of an attribute's value in `markup`, quotes excluded.
    pub fn value_span(&self, markup: &str, name: &str) -> Option<Range<usize>> {
        let base = self.attr_span.start;
        ATTR_RE
            .captures_iter(&markup[self.attr_span.clone()])
            .find(|caps| caps[1].eq_ignore_ascii_case(name))
            .and_then(|caps| caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)))
            .map(|m| base + m.start()..base + m.end())
    }

    /// Offset where a new attribute can be inserted: after the last existing
    /// attribute, before any whitespace, `/` or `>`.
    pub fn insertion_point(&self, markup: &str) -> usize {
        let attrs = &markup[self.attr_span.clone()];
        self.attr_span.start + attrs.trim_end().len()
    }
}

fn parse_attrs(raw: &str) -> Vec<(String, Option<String>)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string());
            (name, value)
        })
        .collect()
}

/// Offset of the `</name` that ends a raw text element opened before `from`.
fn raw_text_end(markup: &str, from: usize, name: &str) -> usize {
    RAW_TEXT_CLOSE_RE
        .captures_iter(&markup[from..])
        .filter(|caps| caps[1].eq_ignore_ascii_case(name))
        .find_map(|caps| caps.get(0))
        .map(|m| from + m.start())
        .unwrap_or(markup.len())
}

/// Offset of the `>` closing a tag whose attributes start at `from`.
///
/// A quote delimits a value only directly after `=` (whitespace allowed);
/// anywhere else it is an ordinary character, as in the HTML tokenizer.
fn tag_close(markup: &str, from: usize) -> Option<usize> {
    let bytes = markup.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'>' => return Some(i),
            b'=' => {
                i += 1;
                while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
                    i += 1;
                }
                if let Some(&quote @ (b'"' | b'\'')) = bytes.get(i) {
                    let len = markup[i + 1..].find(quote as char)?;
                    i += len + 2;
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Scan `markup` for tags in document order.
///
/// Comments are skipped, as is the content of `<script>`, `<style>` and
/// `<textarea>`; their closing tags are still reported.
pub fn scan_tags(markup: &str, regions: &CriticalRegions) -> Vec<Tag> {
    let mut tags = Vec::new();
    // (element name, starts a critical region)
    let mut open: Vec<(String, bool)> = Vec::new();
    let mut pos = 0;

    while let Some(caps) = TAG_OPEN_RE.captures_at(markup, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let Some(name) = caps.get(2) else {
            pos = whole.end(); // comment
            continue;
        };
        let Some(gt) = tag_close(markup, name.end()) else {
            pos = name.end();
            continue;
        };
        pos = gt + 1;

        let self_closing = gt > name.end() && markup.as_bytes()[gt - 1] == b'/';
        let attr_span = name.end()..if self_closing { gt - 1 } else { gt };
        let mut tag = Tag {
            name: name.as_str().to_lowercase(),
            attrs: parse_attrs(&markup[attr_span.clone()]),
            closing: caps.get(1).is_some_and(|m| !m.is_empty()),
            self_closing,
            span: whole.start()..gt + 1,
            attr_span,
            in_critical_region: open.iter().any(|(_, critical)| *critical),
        };

        if tag.closing {
            if let Some(idx) = open.iter().rposition(|(n, _)| *n == tag.name) {
                open.truncate(idx);
            }
            tag.in_critical_region = open.iter().any(|(_, critical)| *critical);
        } else if !tag.self_closing && !VOID_ELEMENTS.contains(&tag.name.as_str()) {
            open.push((tag.name.clone(), regions.is_critical(&tag)));
            if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                pos = raw_text_end(markup, pos, &tag.name);
            }
        }

        tags.push(tag);
    }

    tags
}

/// Remove each span from `markup`. A span that is alone on its line takes
/// the whole line, newline included, with it. Spans must be sorted and disjoint.
pub fn remove_spans(markup: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut last = 0;
    for span in spans {
        let line_start = markup[..span.start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = markup[span.end..]
            .find('\n')
            .map(|i| span.end + i + 1)
            .unwrap_or(markup.len());
        let alone = markup[line_start..span.start].trim().is_empty()
            && markup[span.end..line_end].trim().is_empty();
        let (start, end) = if alone && line_start >= last {
            (line_start, line_end)
        } else {
            (span.start, span.end)
        };
        out.push_str(&markup[last..start.max(last)]);
        last = end.max(last);
    }
    out.push_str(&markup[last..]);
    out
}
