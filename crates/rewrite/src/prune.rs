// ABOUTME: Drops <script src> and <link href> tags for resources a loader script fetches on demand.
// ABOUTME: Adds the loader before </body>, with a ../ prefix matching the page's depth under the root.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use sitekit_core::{Result, SiteError};

use crate::cleanup::collapse_blank_runs;
use crate::protect::map_free;
use crate::tags::{remove_spans, scan_tags, CriticalRegions};

static HEAD_LEADING_BLANK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(<head(?:\s[^>]*)?>)[ \t]*\n\s*\n").unwrap());
static HEAD_TRAILING_BLANK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\n\s*\n(\s*</head>)").unwrap());
static BODY_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</body\s*>").unwrap());

/// Resources to strip from pages and the loader that replaces them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneRules {
    /// Substrings of a `src`/`href` (case-insensitive) marking a removable resource.
    pub resources: Vec<String>,
    /// Loader path relative to the site root, e.g. `js/loader.min.js`.
    pub loader: Option<String>,
}

impl PruneRules {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.loader.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    pub resources_removed: usize,
    pub loader_inserted: bool,
}

impl PruneStats {
    pub fn changed(&self) -> bool {
        self.resources_removed > 0 || self.loader_inserted
    }
}

#[derive(Debug, Clone)]
pub struct Pruner {
    rules: PruneRules,
    resources: AhoCorasick,
}

impl Pruner {
    pub fn new(rules: PruneRules) -> Result<Self> {
        let resources = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&rules.resources)
            .map_err(|e| SiteError::config("prune", "compile resources", Some(e.into())))?;
        Ok(Self { rules, resources })
    }

    fn is_pruned(&self, url: Option<&str>) -> bool {
        !self.rules.resources.is_empty()
            && url
                .map(|u| !u.is_empty() && self.resources.is_match(u))
                .unwrap_or(false)
    }

    /// Prune `markup` for the page at `rel_path` (`/`-separated, relative to the root).
    pub fn apply(&self, markup: &str, rel_path: &str) -> (String, PruneStats) {
        let mut stats = PruneStats::default();
        let tags = scan_tags(markup, &CriticalRegions::default());

        let mut spans = Vec::new();
        for (i, tag) in tags.iter().enumerate() {
            if tag.closing {
                continue;
            }
            match tag.name.as_str() {
                "script" if self.is_pruned(tag.attr("src")) => {
                    let end = tags[i + 1..]
                        .iter()
                        .find(|t| t.closing && t.name == "script")
                        .map(|t| t.span.end)
                        .unwrap_or(tag.span.end);
                    spans.push(tag.span.start..end);
                }
                "link" if self.is_pruned(tag.attr("href")) => spans.push(tag.span.clone()),
                _ => {}
            }
        }
        stats.resources_removed = spans.len();

        let mut out = if spans.is_empty() {
            markup.to_string()
        } else {
            remove_spans(markup, &spans)
        };

        if let Some(loader) = &self.rules.loader {
            let name = loader.rsplit('/').next().unwrap_or(loader);
            if !out.contains(name) {
                let prefix = "../".repeat(rel_path.matches('/').count());
                let script = format!(r#"    <script src="{}{}" defer></script>"#, prefix, loader);
                out = match BODY_CLOSE_RE.find(&out) {
                    Some(body) => format!("{}{}\n{}", &out[..body.start()], script, &out[body.start()..]),
                    None => format!("{}\n{}", out, script),
                };
                stats.loader_inserted = true;
            }
        }

        if stats.changed() {
            out = map_free(&out, |text| {
                let text = collapse_blank_runs(text);
                let text = HEAD_LEADING_BLANK_RE.replace_all(&text, "$1\n");
                HEAD_TRAILING_BLANK_RE.replace_all(&text, "\n$1").into_owned()
            });
        }
        (out, stats)
    }
}
