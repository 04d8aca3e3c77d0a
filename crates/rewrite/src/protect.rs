// ABOUTME: Splits markup into protected raw-text blocks and free segments.
// ABOUTME: Text passes map the free segments only and put protected blocks back byte-for-byte.

use once_cell::sync::Lazy;
use regex::Regex;

static PROTECTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<textarea\b[^>]*>.*?</textarea\s*>|<pre\b[^>]*>.*?</pre\s*>",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Free(&'a str),
    /// A whole `<script>`, `<style>`, `<textarea>` or `<pre>` element.
    Protected(&'a str),
}

/// Split `markup` into alternating free and protected segments, in order.
pub fn segments(markup: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in PROTECTED_RE.find_iter(markup) {
        if m.start() > last {
            out.push(Segment::Free(&markup[last..m.start()]));
        }
        out.push(Segment::Protected(m.as_str()));
        last = m.end();
    }
    if last < markup.len() {
        out.push(Segment::Free(&markup[last..]));
    }
    out
}

/// Apply `free` to the free segments only; protected blocks are copied as-is.
pub fn map_free<F>(markup: &str, mut free: F) -> String
where
    F: FnMut(&str) -> String,
{
    segments(markup)
        .into_iter()
        .map(|segment| match segment {
            Segment::Free(text) => free(text),
            Segment::Protected(block) => block.to_string(),
        })
        .collect()
}
