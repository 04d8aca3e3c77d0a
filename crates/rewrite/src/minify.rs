// ABOUTME: Whitespace and comment minifier for HTML pages and their inline CSS.
// ABOUTME: Script, textarea and pre blocks pass through untouched; inline <style> is CSS-minified.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use sitekit_core::{Result, SiteError};

use crate::cleanup::strip_comments;
use crate::protect::{segments, Segment};

static CSS_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static CSS_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([{}:;,>+~])\s*").unwrap());
static CSS_LAST_SEMI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s*\}").unwrap());

static BETWEEN_TAGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());
static LINE_EDGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]+|[ \t]+$").unwrap());
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static STYLE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^(<style\b[^>]*>)(.*?)(</style\s*>)$").unwrap());

/// Minify a stylesheet: comments dropped, whitespace collapsed and removed
/// around punctuation, trailing `;` before `}` dropped.
pub fn minify_css(css: &str) -> String {
    let css = CSS_COMMENT_RE.replace_all(css, "");
    let css = WHITESPACE_RE.replace_all(&css, " ");
    let css = CSS_PUNCT_RE.replace_all(&css, "$1");
    let css = CSS_LAST_SEMI_RE.replace_all(&css, "}");
    css.trim().to_string()
}

fn minify_free(text: &str) -> String {
    let mut removed = 0;
    let text = strip_comments(text, &mut removed);
    let text = BETWEEN_TAGS_RE.replace_all(&text, "><");
    let text = LINE_EDGES_RE.replace_all(&text, "");
    MULTI_SPACE_RE.replace_all(&text, " ").into_owned()
}

fn minify_protected(block: &str) -> String {
    match STYLE_BLOCK_RE.captures(block) {
        Some(caps) => format!("{}{}{}", &caps[1], minify_css(&caps[2]), &caps[3]),
        None => block.to_string(),
    }
}

/// Minify a whole HTML document.
///
/// Protected blocks begin and end with a tag, so whitespace between one and
/// a neighbouring tag is dropped like any other inter-tag whitespace.
pub fn minify_html(markup: &str) -> String {
    let segments = segments(markup);
    let is_block = |i: Option<usize>| {
        i.and_then(|i| segments.get(i))
            .map(|s| matches!(s, Segment::Protected(_)))
            .unwrap_or(false)
    };

    let mut out = String::with_capacity(markup.len());
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Protected(block) => out.push_str(&minify_protected(block)),
            Segment::Free(text) => {
                let mut text = minify_free(text);
                let blank = text.trim().is_empty();
                if is_block(i.checked_sub(1)) && (blank || text.trim_start().starts_with('<')) {
                    text = text.trim_start().to_string();
                }
                if is_block(Some(i + 1)) && (blank || text.trim_end().ends_with('>')) {
                    text = text.trim_end().to_string();
                }
                out.push_str(&text);
            }
        }
    }
    out.trim().to_string()
}

/// Sizes before and after minification, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MinifyStats {
    pub original_bytes: usize,
    pub minified_bytes: usize,
}

impl MinifyStats {
    pub fn new(original: &str, minified: &str) -> Self {
        Self {
            original_bytes: original.len(),
            minified_bytes: minified.len(),
        }
    }

    pub fn saved_bytes(&self) -> usize {
        self.original_bytes.saturating_sub(self.minified_bytes)
    }

    pub fn reduction_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.saved_bytes() as f64 / self.original_bytes as f64 * 100.0
    }
}

/// Minify `input` into `output` (which may be the same path).
pub fn minify_file(input: &Path, output: &Path) -> Result<MinifyStats> {
    let markup = fs::read_to_string(input)
        .map_err(|e| SiteError::io(input, "read", Some(e.into())))?;
    let minified = minify_html(&markup);
    fs::write(output, &minified).map_err(|e| SiteError::io(output, "write", Some(e.into())))?;
    Ok(MinifyStats::new(&markup, &minified))
}
