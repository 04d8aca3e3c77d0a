// ABOUTME: Scans pages for the placement of the UTF-8 charset declaration.
// ABOUTME: The declaration must be the first thing inside <head>; anything else is reported.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use sitekit_core::markup::{declared_charset, has_doctype, head_open, utf8_charset};
use sitekit_core::{
    discover_html, relative_path, truncate_chars, Document, FileError, Result, ScanOptions,
};

static FIRST_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

const PRECEDING_TAG_CHARS: usize = 50;

/// Where the UTF-8 declaration sits relative to `<head>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CharsetStatus {
    Correct,
    Missing,
    /// `preceding` is the first tag found ahead of the declaration, if any.
    WrongPosition { preceding: Option<String> },
    NoHead,
}

impl CharsetStatus {
    pub fn is_correct(&self) -> bool {
        matches!(self, CharsetStatus::Correct)
    }

    pub fn message(&self) -> String {
        match self {
            CharsetStatus::Correct => "Charset is properly positioned first in <head>".to_string(),
            CharsetStatus::Missing => "No charset meta tag found".to_string(),
            CharsetStatus::WrongPosition {
                preceding: Some(tag),
            } => format!("Content before charset: {}...", tag),
            CharsetStatus::WrongPosition { preceding: None } => {
                "Charset is outside <head> or follows non-tag content".to_string()
            }
            CharsetStatus::NoHead => "No <head> tag found".to_string(),
        }
    }
}

/// Classifies the UTF-8 charset placement of raw markup.
pub fn charset_status(markup: &str) -> CharsetStatus {
    let Some(head) = head_open(markup) else {
        return CharsetStatus::NoHead;
    };
    let Some(charset) = utf8_charset(markup) else {
        return CharsetStatus::Missing;
    };
    if charset.start < head.end {
        return CharsetStatus::WrongPosition { preceding: None };
    }

    let between = markup[head.end..charset.start].trim();
    if between.is_empty() {
        return CharsetStatus::Correct;
    }
    CharsetStatus::WrongPosition {
        preceding: FIRST_TAG_RE
            .find(between)
            .map(|m| truncate_chars(m.as_str(), PRECEDING_TAG_CHARS).to_string()),
    }
}

/// Charset findings for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharsetScan {
    pub file: String,
    pub has_doctype: bool,
    /// Charset named by any `<meta charset>`, lowercased.
    pub declared: Option<String>,
    #[serde(flatten)]
    pub status: CharsetStatus,
}

impl CharsetScan {
    pub fn of(doc: &Document) -> Self {
        Self {
            file: doc.rel_path.clone(),
            has_doctype: has_doctype(&doc.markup),
            declared: declared_charset(&doc.markup),
            status: charset_status(&doc.markup),
        }
    }

    /// True when a charset other than UTF-8 is declared.
    pub fn declares_other_charset(&self) -> bool {
        self.declared
            .as_deref()
            .map(|c| c != "utf-8" && c != "utf8")
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CharsetReport {
    pub scans: Vec<CharsetScan>,
    pub errors: Vec<FileError>,
}

impl CharsetReport {
    pub fn correct(&self) -> impl Iterator<Item = &CharsetScan> {
        self.scans.iter().filter(|s| s.status.is_correct())
    }

    pub fn needing_fixes(&self) -> impl Iterator<Item = &CharsetScan> {
        self.scans.iter().filter(|s| !s.status.is_correct())
    }
}

/// Scan every page under the root. Pages that are not valid UTF-8 are errors.
pub fn scan_site(opts: &ScanOptions) -> Result<CharsetReport> {
    let mut report = CharsetReport::default();
    for path in discover_html(opts)? {
        match Document::load_strict(&path, &opts.root) {
            Ok(doc) => {
                let scan = CharsetScan::of(&doc);
                debug!(file = %scan.file, status = ?scan.status, "scanned charset");
                report.scans.push(scan);
            }
            Err(err) => {
                let file = relative_path(&path, &opts.root);
                warn!(file = %file, error = %err, "failed to scan charset");
                report.errors.push(FileError::new(file, &err));
            }
        }
    }
    Ok(report)
}
