// ABOUTME: Keyword density over a page's visible text.
// ABOUTME: Counts whole-word phrase occurrences and reports them as a share of all words.

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{Html, Node};
use serde::Serialize;

use sitekit_core::Document;

const HIDDEN_ELEMENTS: &[&str] = &["script", "style"];

fn collect_visible(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => collect_visible(child, out),
            _ => {}
        }
    }
}

/// Lowercased visible text: script/style dropped, each line trimmed,
/// double-space separated chunks split apart, blanks dropped, then joined by
/// single spaces.
pub fn visible_text(html: &Html) -> String {
    let mut raw = String::new();
    collect_visible(html.tree.root(), &mut raw);

    raw.lines()
        .flat_map(|line| line.trim().split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordDensity {
    pub phrase: String,
    pub count: usize,
    /// Percentage of all words taken up by this phrase, two decimals.
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityReport {
    pub file: String,
    pub total_words: usize,
    /// Sorted by count, highest first; ties keep the requested order.
    pub keywords: Vec<KeywordDensity>,
}

impl DensityReport {
    pub fn get(&self, phrase: &str) -> Option<&KeywordDensity> {
        self.keywords.iter().find(|k| k.phrase == phrase)
    }
}

/// Whole-word occurrences of `phrase` in already-lowercased `text`.
pub fn count_phrase(text: &str, phrase: &str) -> usize {
    let pattern = format!(r"\b{}\b", regex::escape(&phrase.to_lowercase()));
    Regex::new(&pattern)
        .map(|re| re.find_iter(text).count())
        .unwrap_or(0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Density of each phrase in `text`.
pub fn measure<S: AsRef<str>>(text: &str, phrases: &[S]) -> (usize, Vec<KeywordDensity>) {
    let total_words = text.split_whitespace().count();
    let mut keywords: Vec<KeywordDensity> = phrases
        .iter()
        .map(|phrase| {
            let phrase = phrase.as_ref();
            let count = count_phrase(text, phrase);
            let density = if total_words == 0 {
                0.0
            } else {
                let words_in_phrase = phrase.split_whitespace().count();
                round2((count * words_in_phrase) as f64 / total_words as f64 * 100.0)
            };
            KeywordDensity {
                phrase: phrase.to_string(),
                count,
                density,
            }
        })
        .collect();
    keywords.sort_by(|a, b| b.count.cmp(&a.count));
    (total_words, keywords)
}

pub fn analyze_document<S: AsRef<str>>(doc: &Document, phrases: &[S]) -> DensityReport {
    let text = visible_text(&doc.parse());
    let (total_words, keywords) = measure(&text, phrases);
    DensityReport {
        file: doc.rel_path.clone(),
        total_words,
        keywords,
    }
}
