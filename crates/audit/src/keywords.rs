// ABOUTME: Title tokenization and keyword normalization for the alignment checker.
// ABOUTME: Splits titles on separators, strips punctuation and plural suffixes, and drops stop words.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Function words (plus the possessives "your"/"our") never treated as keywords.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "and", "or", "of", "in", "on", "at", "to", "for", "a", "an", "is", "are", "was", "were",
    "be", "been", "being", "have", "has", "had", "do", "does", "did", "will", "would", "should",
    "could", "may", "might", "must", "can", "shall", "with", "by", "from", "up", "about", "into",
    "through", "during", "before", "after", "above", "below", "between", "under", "again",
    "further", "then", "once", "your", "our",
];

static TITLE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[|–—-]").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Plural suffix rules, tried in order: (suffix, replacement).
const PLURAL_RULES: &[(&str, &str)] = &[("ies", "y"), ("es", ""), ("s", "")];

/// A stemmed stripped result must be longer than this to be accepted.
const MIN_STEM_CHARS: usize = 3;

/// A meaningful word taken from a page title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyword {
    /// The token as it appeared in the title.
    pub surface: String,
    /// The normalized form used for matching.
    pub normalized: String,
}

/// Set of lowercase words excluded from keyword extraction.
#[derive(Debug, Clone)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        )
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS)
    }
}

/// Candidate stems for `word`, one per applicable plural rule.
fn plural_candidates(word: &str) -> Vec<String> {
    PLURAL_RULES
        .iter()
        .filter(|(suffix, _)| word.ends_with(suffix))
        .filter(|(suffix, _)| !(*suffix == "s" && word.ends_with("ss")))
        .map(|(suffix, replacement)| {
            format!("{}{}", &word[..word.len() - suffix.len()], replacement)
        })
        .filter(|stem| stem.chars().count() > MIN_STEM_CHARS)
        .collect()
}

/// Normalizes a word for comparison.
///
/// Lowercases, strips anything that is neither a word character nor
/// whitespace, then strips one plural suffix. A stem is only taken when no
/// rule would strip it again, so `normalize_token` is idempotent.
pub fn normalize_token(word: &str) -> String {
    let cleaned = NON_WORD.replace_all(&word.to_lowercase(), "").into_owned();
    plural_candidates(&cleaned)
        .into_iter()
        .find(|stem| plural_candidates(stem).is_empty())
        .unwrap_or(cleaned)
}

/// Extracts the meaningful keywords of a title, in order and without repeats.
///
/// Tokens that normalize to two characters or fewer, or to a stop word, are
/// dropped.
pub fn extract_keywords(title: &str, stop_words: &StopWords) -> Vec<Keyword> {
    let spaced = TITLE_SEPARATORS.replace_all(title, " ");
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for surface in spaced.split_whitespace() {
        let normalized = normalize_token(surface);
        if normalized.chars().count() <= 2 || stop_words.contains(&normalized) {
            continue;
        }
        if seen.insert(normalized.clone()) {
            keywords.push(Keyword {
                surface: surface.to_string(),
                normalized,
            });
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normalized(title: &str) -> Vec<String> {
        extract_keywords(title, &StopWords::default())
            .into_iter()
            .map(|k| k.normalized)
            .collect()
    }

    #[test]
    fn test_normalize_plurals() {
        assert_eq!(normalize_token("Cities"), "city");
        assert_eq!(normalize_token("Gutters"), "gutter");
        assert_eq!(normalize_token("roofers,"), "roofer");
        assert_eq!(normalize_token("Roofing"), "roofing");
        assert_eq!(normalize_token("glasses"), "glass");
        assert_eq!(normalize_token("clauses"), "clause");
    }

    #[test]
    fn test_normalize_keeps_short_words() {
        assert_eq!(normalize_token("bus"), "bus");
        assert_eq!(normalize_token("gas"), "gas");
        assert_eq!(normalize_token("MI"), "mi");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for word in [
            "Services", "cities", "glasses", "clauses", "boxes", "houses", "status", "analysis",
            "Roof's", "pies", "seams", "address", "buses", "series",
        ] {
            let once = normalize_token(word);
            assert_eq!(normalize_token(&once), once, "not idempotent for {word}");
        }
    }

    #[test]
    fn test_extract_title_keywords() {
        assert_eq!(
            normalized("Metal Roofing Birmingham MI | Standing Seam"),
            vec!["metal", "roofing", "birmingham", "standing", "seam"]
        );
    }

    #[test]
    fn test_extract_splits_on_dashes_and_drops_stop_words() {
        assert_eq!(
            normalized("Your Roof—Repair for the Home – Our Team-Work"),
            vec!["roof", "repair", "home", "team", "work"]
        );
    }

    #[test]
    fn test_no_keyword_is_a_stop_word() {
        let stop = StopWords::new(["roof"]);
        let keywords = extract_keywords("Roof Roofs Roofing", &stop);
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].normalized, "roofing");
        assert!(keywords.iter().all(|k| !stop.contains(&k.normalized)));
    }

    #[test]
    fn test_duplicates_collapse_keeping_first_surface() {
        let keywords = extract_keywords("Gutters | Gutter Repair", &StopWords::default());
        assert_eq!(keywords[0].surface, "Gutters");
        assert_eq!(keywords.len(), 2);
    }
}
