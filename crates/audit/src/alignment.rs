// ABOUTME: Title/content keyword alignment checker for a single document.
// ABOUTME: Matches normalized title keywords (and suffix variations) against boilerplate-free body text.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use sitekit_core::{title_of, Document};

use crate::body::{body_text, first_content_text, Boilerplate, DEFAULT_BOILERPLATE_SELECTORS};
use crate::keywords::{extract_keywords, Keyword, StopWords, DEFAULT_STOP_WORDS};
use crate::suggest::{suggest, SuggestionRules};

static H1_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static P_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// How a keyword variation is located in the body text.
///
/// `Substring` is the historical behavior and can report false positives
/// ("cats" inside "concatscript"); `WordBoundary` requires whole words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Substring,
    WordBoundary,
}

/// The accepted morphological variations of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variation {
    Exact,
    Plural,
    PluralEs,
    Gerund,
    PastTense,
}

impl Variation {
    pub const ALL: [Variation; 5] = [
        Variation::Exact,
        Variation::Plural,
        Variation::PluralEs,
        Variation::Gerund,
        Variation::PastTense,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Variation::Exact => "",
            Variation::Plural => "s",
            Variation::PluralEs => "es",
            Variation::Gerund => "ing",
            Variation::PastTense => "ed",
        }
    }

    pub fn apply(self, word: &str) -> String {
        format!("{}{}", word, self.suffix())
    }
}

/// Outcome of looking for one keyword in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordMatch {
    pub keyword: Keyword,
    pub variation: Option<Variation>,
}

impl KeywordMatch {
    pub fn found(&self) -> bool {
        self.variation.is_some()
    }
}

/// Whole-word pattern with one capture group per variation, in `Variation::ALL` order.
fn variations_pattern(word: &str) -> Option<Regex> {
    let alternatives: Vec<String> = Variation::ALL
        .iter()
        .map(|v| format!("({})", regex::escape(&v.apply(word))))
        .collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).ok()
}

/// Finds the first variation of `word` present in `body`.
pub fn find_variation(word: &str, body: &str, mode: MatchMode) -> Option<Variation> {
    match mode {
        MatchMode::Substring => Variation::ALL
            .into_iter()
            .find(|v| body.contains(&v.apply(word))),
        MatchMode::WordBoundary => {
            let pattern = variations_pattern(word)?;
            let mut first: Option<usize> = None;
            for caps in pattern.captures_iter(body) {
                let Some(idx) = (1..caps.len()).find(|&i| caps.get(i).is_some()) else {
                    continue;
                };
                first = Some(first.map_or(idx, |f| f.min(idx)));
                if idx == 1 {
                    break;
                }
            }
            first.map(|idx| Variation::ALL[idx - 1])
        }
    }
}

/// Serializable settings for the checker; the defaults reproduce the stock tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub stop_words: Vec<String>,
    pub boilerplate_selectors: Vec<String>,
    pub match_mode: MatchMode,
    pub suggestions: SuggestionRules,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            boilerplate_selectors: DEFAULT_BOILERPLATE_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            match_mode: MatchMode::Substring,
            suggestions: SuggestionRules::default(),
        }
    }
}

/// Alignment findings for one page that has a title with keywords.
#[derive(Debug, Clone, Serialize)]
pub struct PageAlignment {
    pub file: String,
    pub title: String,
    pub matches: Vec<KeywordMatch>,
    pub suggestions: Vec<String>,
}

impl PageAlignment {
    pub fn title_words(&self) -> Vec<String> {
        self.matches
            .iter()
            .map(|m| m.keyword.normalized.clone())
            .collect()
    }

    pub fn found_words(&self) -> Vec<String> {
        self.words_where(true)
    }

    pub fn missing_words(&self) -> Vec<String> {
        self.words_where(false)
    }

    pub fn has_issues(&self) -> bool {
        self.matches.iter().any(|m| !m.found())
    }

    fn words_where(&self, found: bool) -> Vec<String> {
        self.matches
            .iter()
            .filter(|m| m.found() == found)
            .map(|m| m.keyword.normalized.clone())
            .collect()
    }
}

/// What happened when a document was checked.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Checked(PageAlignment),
    NoTitle,
    NoKeywords { title: String },
}

/// Keyword alignment checker with its data tables compiled.
#[derive(Debug, Clone)]
pub struct Checker {
    stop_words: StopWords,
    boilerplate: Boilerplate,
    mode: MatchMode,
    rules: SuggestionRules,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new(&AlignmentConfig::default())
    }
}

impl Checker {
    pub fn new(config: &AlignmentConfig) -> Self {
        Self {
            stop_words: StopWords::new(&config.stop_words),
            boilerplate: Boilerplate::new(&config.boilerplate_selectors),
            mode: config.match_mode,
            rules: config.suggestions.clone(),
        }
    }

    /// Override the match mode.
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check one document. Never fails: malformed markup is parsed best-effort.
    pub fn check(&self, doc: &Document) -> PageOutcome {
        let html = doc.parse();

        let Some(title) = title_of(&html) else {
            return PageOutcome::NoTitle;
        };
        let keywords = extract_keywords(&title, &self.stop_words);
        if keywords.is_empty() {
            return PageOutcome::NoKeywords { title };
        }

        let excluded = self.boilerplate.excluded_ids(&html);
        let body = body_text(&html, &excluded);

        let matches: Vec<KeywordMatch> = keywords
            .into_iter()
            .map(|keyword| {
                let variation = find_variation(&keyword.normalized, &body, self.mode);
                KeywordMatch { keyword, variation }
            })
            .collect();

        let mut page = PageAlignment {
            file: doc.rel_path.clone(),
            title,
            matches,
            suggestions: Vec::new(),
        };

        let missing = page.missing_words();
        if !missing.is_empty() {
            let h1 = first_content_text(&html, &H1_SEL, &excluded);
            let para = first_content_text(&html, &P_SEL, &excluded);
            page.suggestions = suggest(&missing, h1.as_deref(), para.as_deref(), &self.rules);
        }

        PageOutcome::Checked(page)
    }
}
