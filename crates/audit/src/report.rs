// ABOUTME: Site-wide keyword alignment batch and its JSON report.
// ABOUTME: Aggregates per-page findings, skips, and errors into summary, severity, and frequency views.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sitekit_core::{
    discover_html, relative_path, Document, FileError, Result, ScanOptions, SiteError,
};

use crate::alignment::{Checker, PageAlignment, PageOutcome};

/// Where the CLI writes the report unless told otherwise.
pub const DEFAULT_REPORT_PATH: &str = "title_content_analysis.json";

/// A word missing on more than this many pages earns a site-wide recommendation.
const GLOBAL_STRATEGY_THRESHOLD: usize = 3;

/// Generic advice printed under every report.
pub const BEST_PRACTICES: &[&str] = &[
    "Include all title keywords in the first 100 words of content",
    "Use title keywords in H1 and H2 headings",
    "Naturally incorporate keywords in meta descriptions",
    "Ensure title keywords appear in image alt text where relevant",
    "Add keywords to the page URL structure when possible",
];

/// One page whose body is missing at least one title keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageIssue {
    pub file: String,
    pub title: String,
    pub title_words: Vec<String>,
    pub missing_words: Vec<String>,
    pub found_words: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl From<PageAlignment> for PageIssue {
    fn from(page: PageAlignment) -> Self {
        Self {
            title_words: page.title_words(),
            missing_words: page.missing_words(),
            found_words: page.found_words(),
            file: page.file,
            title: page.title,
            suggestions: page.suggestions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoTitle,
    NoKeywords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub file: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_analyzed: usize,
    pub pages_with_issues: usize,
    pub compliance_rate: String,
}

/// Result of checking every page under a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub total_pages: usize,
    pub pages_with_issues: Vec<PageIssue>,
    pub summary: Summary,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub skipped: Vec<SkippedPage>,
    #[serde(default)]
    pub errors: Vec<FileError>,
}

/// Percentage of pages without issues, one decimal place; "0%" for an empty site.
pub fn compliance_rate(total: usize, with_issues: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let clean = total.saturating_sub(with_issues) as f64;
    format!("{:.1}%", clean / total as f64 * 100.0)
}

impl AlignmentReport {
    /// Assemble a report, deriving the summary and recommendations.
    pub fn new(
        total_pages: usize,
        pages_with_issues: Vec<PageIssue>,
        skipped: Vec<SkippedPage>,
        errors: Vec<FileError>,
    ) -> Self {
        let summary = Summary {
            total_analyzed: total_pages,
            pages_with_issues: pages_with_issues.len(),
            compliance_rate: compliance_rate(total_pages, pages_with_issues.len()),
        };
        let mut report = Self {
            total_pages,
            pages_with_issues,
            summary,
            recommendations: Vec::new(),
            skipped,
            errors,
        };
        report.recommendations = report
            .most_missing(usize::MAX)
            .into_iter()
            .filter(|(_, count)| *count > GLOBAL_STRATEGY_THRESHOLD)
            .map(|(word, _)| {
                format!("Consider adding '{}' to your global content strategy", word)
            })
            .collect();
        report
    }

    /// Pages grouped by number of missing words, most missing first.
    pub fn by_severity(&self) -> Vec<(usize, Vec<&PageIssue>)> {
        let mut groups: BTreeMap<usize, Vec<&PageIssue>> = BTreeMap::new();
        for page in &self.pages_with_issues {
            groups.entry(page.missing_words.len()).or_default().push(page);
        }
        groups.into_iter().rev().collect()
    }

    /// The `n` words missing on the most pages, ties broken alphabetically.
    pub fn most_missing(&self, n: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in self.pages_with_issues.iter().flat_map(|p| &p.missing_words) {
            *counts.entry(word.as_str()).or_default() += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(word, count)| (word.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Write the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SiteError::report(path, "serialize", Some(e.into())))?;
        fs::write(path, json).map_err(|e| SiteError::io(path, "write", Some(e.into())))
    }

    /// Read a report previously written by [`AlignmentReport::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| SiteError::report(path, "read", Some(e.into())))?;
        serde_json::from_str(&json).map_err(|e| SiteError::report(path, "parse", Some(e.into())))
    }
}

/// Check every page under `opts.root`.
///
/// Only a missing root (or an invalid filter pattern) fails the batch; each
/// unreadable page becomes an entry in `errors`.
pub fn analyze_site(opts: &ScanOptions, checker: &Checker) -> Result<AlignmentReport> {
    let files = discover_html(opts)?;
    info!(root = %opts.root.display(), files = files.len(), "analyzing title/content alignment");

    let mut issues = Vec::new();
    let mut skipped = Vec::new();
    let mut errors = Vec::new();

    for path in &files {
        let file = relative_path(path, &opts.root);
        let doc = match Document::load(path, &opts.root) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(file = %file, error = %err, "failed to read page");
                errors.push(FileError::new(file, &err));
                continue;
            }
        };

        match checker.check(&doc) {
            PageOutcome::Checked(page) if page.has_issues() => {
                debug!(file = %file, missing = ?page.missing_words(), "title words missing from content");
                issues.push(PageIssue::from(page));
            }
            PageOutcome::Checked(_) => debug!(file = %file, "all title words found"),
            PageOutcome::NoTitle => {
                warn!(file = %file, "no title tag found");
                skipped.push(SkippedPage {
                    file,
                    reason: SkipReason::NoTitle,
                });
            }
            PageOutcome::NoKeywords { title } => {
                warn!(file = %file, title = %title, "no meaningful words in title");
                skipped.push(SkippedPage {
                    file,
                    reason: SkipReason::NoKeywords,
                });
            }
        }
    }

    Ok(AlignmentReport::new(files.len(), issues, skipped, errors))
}
