// ABOUTME: Moves the UTF-8 charset declaration to the first line inside <head>.
// ABOUTME: Single-page fix plus a site batch that backs pages up before writing them.

use serde::Serialize;
use tracing::{debug, info, warn};

use sitekit_core::markup::{head_open, utf8_charset};
use sitekit_core::{
    discover_html, relative_path, Backup, Document, FileError, Result, ScanOptions,
};

use crate::tags::remove_spans;

const CHARSET_LINE: &str = r#"    <meta charset="UTF-8">"#;

/// What fixing one page's charset did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharsetFix {
    /// The declaration was moved; holds the new markup.
    Fixed(String),
    /// No declaration existed and one was added; holds the new markup.
    Inserted(String),
    AlreadyCorrect,
    /// No UTF-8 declaration and insertion was not requested.
    Skipped,
    NoHead,
}

impl CharsetFix {
    /// The rewritten markup, when the page changed.
    pub fn markup(&self) -> Option<&str> {
        match self {
            CharsetFix::Fixed(markup) | CharsetFix::Inserted(markup) => Some(markup),
            _ => None,
        }
    }
}

fn insert_after_head(markup: &str) -> Option<String> {
    let head = head_open(markup)?;
    let rest = &markup[head.end..];
    let sep = if rest.starts_with('\n') || rest.starts_with("\r\n") {
        ""
    } else {
        "\n"
    };
    Some(format!(
        "{}\n{}{}{}",
        &markup[..head.end],
        CHARSET_LINE,
        sep,
        rest
    ))
}

/// Put `<meta charset="UTF-8">` on its own line directly after `<head>`.
///
/// A declaration already first in `<head>` is left as written, so the fix
/// is idempotent.
pub fn fix_charset(markup: &str, insert_missing: bool) -> CharsetFix {
    let Some(head) = head_open(markup) else {
        return CharsetFix::NoHead;
    };
    let Some(charset) = utf8_charset(markup) else {
        return match insert_after_head(markup) {
            Some(fixed) if insert_missing => CharsetFix::Inserted(fixed),
            _ => CharsetFix::Skipped,
        };
    };
    if charset.start >= head.end && markup[head.end..charset.start].trim().is_empty() {
        return CharsetFix::AlreadyCorrect;
    }

    let without = remove_spans(markup, &[charset]);
    match insert_after_head(&without) {
        Some(fixed) => CharsetFix::Fixed(fixed),
        None => CharsetFix::NoHead,
    }
}

/// Outcome of a charset fix over a whole site.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CharsetFixReport {
    pub fixed: Vec<String>,
    pub inserted: Vec<String>,
    pub already_correct: Vec<String>,
    pub skipped: Vec<String>,
    pub no_head: Vec<String>,
    pub errors: Vec<FileError>,
}

impl CharsetFixReport {
    pub fn changed(&self) -> usize {
        self.fixed.len() + self.inserted.len()
    }
}

/// Fix every page under the root, copying each into `backup` before it is
/// overwritten. A page whose backup fails is left untouched.
pub fn fix_site(
    opts: &ScanOptions,
    insert_missing: bool,
    backup: Option<&Backup>,
) -> Result<CharsetFixReport> {
    let mut report = CharsetFixReport::default();

    for path in discover_html(opts)? {
        let doc = match Document::load_strict(&path, &opts.root) {
            Ok(doc) => doc,
            Err(err) => {
                let file = relative_path(&path, &opts.root);
                warn!(file = %file, error = %err, "failed to load page");
                report.errors.push(FileError::new(file, &err));
                continue;
            }
        };

        let fix = fix_charset(&doc.markup, insert_missing);
        let Some(markup) = fix.markup() else {
            debug!(file = %doc.rel_path, outcome = ?fix, "charset unchanged");
            match fix {
                CharsetFix::AlreadyCorrect => report.already_correct.push(doc.rel_path),
                CharsetFix::NoHead => report.no_head.push(doc.rel_path),
                _ => report.skipped.push(doc.rel_path),
            }
            continue;
        };

        let written = backup
            .map(|b| b.save(&doc.path, &doc.rel_path).map(|_| ()))
            .unwrap_or(Ok(()))
            .and_then(|()| doc.write_back(markup));
        if let Err(err) = written {
            warn!(file = %doc.rel_path, error = %err, "failed to fix charset");
            report.errors.push(FileError::new(doc.rel_path, &err));
            continue;
        }

        info!(file = %doc.rel_path, "fixed charset");
        match fix {
            CharsetFix::Inserted(_) => report.inserted.push(doc.rel_path),
            _ => report.fixed.push(doc.rel_path),
        }
    }

    Ok(report)
}
