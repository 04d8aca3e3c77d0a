// ABOUTME: Removes dead markup: empty style/script blocks, ordinary HTML comments, runs of blank lines.
// ABOUTME: Conditional comments and the contents of protected blocks are kept.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::protect::{segments, Segment};

// a whole protected block with nothing inside
static EMPTY_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:<style>\s*</style\s*>|<script>\s*</script\s*>)$").unwrap()
});
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static CONDITIONAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<!--\s*\[if").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());

/// True for `<!--[if IE]>`-style comments, which browsers still act on.
pub fn is_conditional_comment(comment: &str) -> bool {
    CONDITIONAL_RE.is_match(comment)
}

/// Remove non-conditional comments from `text`, counting them.
pub fn strip_comments(text: &str, removed: &mut usize) -> String {
    COMMENT_RE
        .replace_all(text, |caps: &regex::Captures| {
            let comment = &caps[0];
            if is_conditional_comment(comment) {
                comment.to_string()
            } else {
                *removed += 1;
                String::new()
            }
        })
        .into_owned()
}

/// Collapse runs of three or more blank-ish lines to a single blank line.
pub fn collapse_blank_runs(text: &str) -> String {
    BLANK_RUN_RE.replace_all(text, "\n\n").into_owned()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupStats {
    pub empty_blocks_removed: usize,
    pub comments_removed: usize,
}

/// Remove empty blocks and comments, then collapse blank runs.
///
/// Only a protected block that is empty as a whole is dropped; free text on
/// either side of it is then cleaned as one run.
pub fn cleanup(markup: &str) -> (String, CleanupStats) {
    let mut stats = CleanupStats::default();
    let mut out = String::with_capacity(markup.len());
    let mut free = String::new();

    for segment in segments(markup) {
        match segment {
            Segment::Free(text) => free.push_str(text),
            Segment::Protected(block) if EMPTY_BLOCK_RE.is_match(block) => {
                stats.empty_blocks_removed += 1;
            }
            Segment::Protected(block) => {
                out.push_str(&clean_free(&free, &mut stats));
                free.clear();
                out.push_str(block);
            }
        }
    }
    out.push_str(&clean_free(&free, &mut stats));

    (out, stats)
}

fn clean_free(text: &str, stats: &mut CleanupStats) -> String {
    if text.is_empty() {
        return String::new();
    }
    collapse_blank_runs(&strip_comments(text, &mut stats.comments_removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_removes_empty_blocks_and_comments() {
        let markup = "<head><style> </style><script>\n</script><!-- build: 42 --><title>x</title></head>";
        let (out, stats) = cleanup(markup);
        assert_eq!(out, "<head><title>x</title></head>");
        assert_eq!(stats.empty_blocks_removed, 2);
        assert_eq!(stats.comments_removed, 1);
    }

    #[test]
    fn test_keeps_conditional_comments_and_scripts() {
        let markup = "<!--[if lt IE 9]><script src=\"html5shiv.js\"></script><![endif]-->\n<script>/* <!-- keep --> */</script>";
        let (out, stats) = cleanup(markup);
        assert_eq!(out, markup);
        assert_eq!(stats.comments_removed, 0);
    }

    #[test]
    fn test_empty_looking_markup_inside_script_is_kept() {
        let markup = r#"<script>var t = "<style></style>"; el.innerHTML = t;</script>"#;
        let (out, stats) = cleanup(markup);
        assert_eq!(out, markup);
        assert_eq!(stats.empty_blocks_removed, 0);
    }

    #[test]
    fn test_blank_lines_around_removed_block_collapse() {
        let (out, stats) = cleanup("<p>a</p>\n\n<style>\n</style>\n\n<p>b</p>");
        assert_eq!(out, "<p>a</p>\n\n<p>b</p>");
        assert_eq!(stats.empty_blocks_removed, 1);
    }

    #[test]
    fn test_collapses_blank_runs() {
        let (out, _) = cleanup("<p>a</p>\n\n   \n\n<p>b</p>\n\n<p>c</p>");
        assert_eq!(out, "<p>a</p>\n\n<p>b</p>\n\n<p>c</p>");
    }

    #[test]
    fn test_script_with_src_is_not_empty() {
        let markup = r#"<script src="a.js"></script>"#;
        assert_eq!(cleanup(markup).0, markup);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let (once, _) = cleanup("<p>a</p>\n\n\n\n<!-- x -->\n\n\n<p>b</p>");
        let (twice, stats) = cleanup(&once);
        assert_eq!(twice, once);
        assert_eq!(stats, CleanupStats::default());
    }
}
