// ABOUTME: Turns an alignment report into concrete content-fix plans per page.
// ABOUTME: Page templates supply replacement snippets; the live page supplies the current H1 and opening.

use std::path::Path;

use once_cell::sync::Lazy;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sitekit_core::{collapse_whitespace, element_text, truncate_chars, Document};

use crate::report::AlignmentReport;

static H1_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static P_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

const OPENING_EXCERPT_CHARS: usize = 100;

/// Snippets proposed for pages whose relative path contains `file`.
///
/// A template only applies when every word in `requires` is among the
/// page's missing words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageTemplate {
    pub file: String,
    pub requires: Vec<String>,
    pub h1: Option<String>,
    pub opening: Option<String>,
    pub h2_addition: Option<String>,
    pub content_addition: Option<String>,
    pub additional: Option<String>,
}

impl PageTemplate {
    fn applies_to(&self, missing: &[String]) -> bool {
        self.requires.iter().all(|w| missing.contains(w))
    }

    fn additions(&self) -> Vec<Addition> {
        [
            (AdditionKind::H1, &self.h1),
            (AdditionKind::Opening, &self.opening),
            (AdditionKind::H2Section, &self.h2_addition),
            (AdditionKind::ContentBlock, &self.content_addition),
            (AdditionKind::Additional, &self.additional),
        ]
        .into_iter()
        .filter_map(|(kind, text)| {
            text.as_ref().map(|text| Addition {
                kind,
                text: text.clone(),
            })
        })
        .collect()
    }
}

/// Templates for the utility pages every site has.
pub fn default_templates() -> Vec<PageTemplate> {
    vec![
        PageTemplate {
            file: "404.html".into(),
            h1: Some("Page Not Found - 404 Error".into()),
            opening: Some(
                "Sorry, the page you're looking for cannot be found. It may have been moved or no longer exists."
                    .into(),
            ),
            additional: Some(
                "If you found this page by following a link, please contact us so we can fix it."
                    .into(),
            ),
            ..Default::default()
        },
        PageTemplate {
            file: "thank-you.html".into(),
            h1: Some("Thank You for Contacting Us".into()),
            opening: Some(
                "Thank you for reaching out! We appreciate your interest in our services.".into(),
            ),
            additional: Some(
                "Our team will review your inquiry and get back to you within 24 hours.".into(),
            ),
            ..Default::default()
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditionKind {
    H1,
    Opening,
    H2Section,
    ContentBlock,
    Additional,
}

impl AdditionKind {
    pub fn label(self) -> &'static str {
        match self {
            AdditionKind::H1 => "Replace/Update H1 Tag",
            AdditionKind::Opening => "Add to Opening Paragraph",
            AdditionKind::H2Section => "Add New H2 Section",
            AdditionKind::ContentBlock => "Add Content Block",
            AdditionKind::Additional => "Additional Content",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Addition {
    pub kind: AdditionKind,
    pub text: String,
}

/// Proposed content changes for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixPlan {
    pub file: String,
    pub missing_words: Vec<String>,
    pub additions: Vec<Addition>,
    pub current_h1: Option<String>,
    pub opening_excerpt: Option<String>,
}

/// Build one plan per page with issues.
///
/// The first template whose `file` occurs in the page path decides the
/// additions. When `root` is given, the page is read to report its current
/// H1 and the start of its first paragraph; an unreadable page just omits
/// them.
pub fn plan_fixes(
    report: &AlignmentReport,
    templates: &[PageTemplate],
    root: Option<&Path>,
) -> Vec<FixPlan> {
    report
        .pages_with_issues
        .iter()
        .map(|page| {
            let additions = templates
                .iter()
                .find(|t| page.file.contains(t.file.as_str()))
                .filter(|t| t.applies_to(&page.missing_words))
                .map(PageTemplate::additions)
                .unwrap_or_default();

            let (current_h1, opening_excerpt) = root
                .map(|root| current_content(root, &page.file))
                .unwrap_or((None, None));

            FixPlan {
                file: page.file.clone(),
                missing_words: page.missing_words.clone(),
                additions,
                current_h1,
                opening_excerpt,
            }
        })
        .collect()
}

fn current_content(root: &Path, rel_path: &str) -> (Option<String>, Option<String>) {
    let doc = match Document::load(&root.join(rel_path), root) {
        Ok(doc) => doc,
        Err(err) => {
            debug!(file = rel_path, error = %err, "page unreadable, skipping current content");
            return (None, None);
        }
    };
    let html = doc.parse();
    let h1 = html
        .select(&H1_SEL)
        .next()
        .map(|el| collapse_whitespace(&element_text(&el)));
    let opening = html
        .select(&P_SEL)
        .next()
        .map(|el| {
            let text = collapse_whitespace(&element_text(&el));
            truncate_chars(&text, OPENING_EXCERPT_CHARS).to_string()
        });
    (h1, opening)
}
