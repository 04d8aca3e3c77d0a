// ABOUTME: Pixel-width estimates for <title> and meta description text.
// ABOUTME: Flags text that overflows search-result display limits and checks required phrases.

use serde::{Deserialize, Serialize};

use sitekit_core::Document;

/// Average glyph width used for the estimate.
pub const PX_PER_CHAR: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaKind {
    Title,
    Description,
}

impl MetaKind {
    pub fn name(self) -> &'static str {
        match self {
            MetaKind::Title => "title",
            MetaKind::Description => "description",
        }
    }
}

/// Display limits for one kind of meta text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaLimits {
    pub max_chars: usize,
    pub max_pixels: usize,
    pub optimal_range: String,
}

impl MetaLimits {
    pub fn title() -> Self {
        Self {
            max_chars: 60,
            max_pixels: 580,
            optimal_range: "55-60 characters".to_string(),
        }
    }

    pub fn description() -> Self {
        Self {
            max_chars: 160,
            max_pixels: 1000,
            optimal_range: "150-155 characters".to_string(),
        }
    }
}

/// Limits plus phrases each kind of text is expected to contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaConfig {
    pub title: MetaLimits,
    pub description: MetaLimits,
    pub title_phrases: Vec<String>,
    pub description_phrases: Vec<String>,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            title: MetaLimits::title(),
            description: MetaLimits::description(),
            title_phrases: Vec::new(),
            description_phrases: Vec::new(),
        }
    }
}

impl MetaConfig {
    pub fn limits(&self, kind: MetaKind) -> &MetaLimits {
        match kind {
            MetaKind::Title => &self.title,
            MetaKind::Description => &self.description,
        }
    }

    pub fn phrases(&self, kind: MetaKind) -> &[String] {
        match kind {
            MetaKind::Title => &self.title_phrases,
            MetaKind::Description => &self.description_phrases,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Optimal,
    /// Within the pixel limit but over the character guideline.
    Borderline,
    TooLong { over_px: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaEstimate {
    pub kind: MetaKind,
    pub text: String,
    pub chars: usize,
    pub pixels: usize,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Estimate `text` against explicit limits.
pub fn estimate_with(text: &str, kind: MetaKind, limits: &MetaLimits) -> MetaEstimate {
    let chars = text.chars().count();
    let pixels = chars * PX_PER_CHAR;
    let verdict = if pixels > limits.max_pixels {
        Verdict::TooLong {
            over_px: pixels - limits.max_pixels,
        }
    } else if chars > limits.max_chars {
        Verdict::Borderline
    } else {
        Verdict::Optimal
    };
    MetaEstimate {
        kind,
        text: text.to_string(),
        chars,
        pixels,
        verdict,
    }
}

/// Estimate `text` against the default limits for `kind`.
pub fn estimate(text: &str, kind: MetaKind) -> MetaEstimate {
    estimate_with(text, kind, MetaConfig::default().limits(kind))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhrasePresence {
    pub phrase: String,
    pub present: bool,
}

/// Case-insensitive substring check for each phrase.
pub fn check_keywords<S: AsRef<str>>(text: &str, phrases: &[S]) -> Vec<PhrasePresence> {
    let haystack = text.to_lowercase();
    phrases
        .iter()
        .map(|p| PhrasePresence {
            phrase: p.as_ref().to_string(),
            present: haystack.contains(&p.as_ref().to_lowercase()),
        })
        .collect()
}

/// Title and description findings for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaCheck {
    pub file: String,
    pub title: Option<MetaEstimate>,
    pub title_phrases: Vec<PhrasePresence>,
    pub description: Option<MetaEstimate>,
    pub description_phrases: Vec<PhrasePresence>,
}

impl MetaCheck {
    /// True when both texts exist and neither exceeds its pixel limit.
    pub fn passes(&self) -> bool {
        [&self.title, &self.description].iter().all(|e| {
            e.as_ref()
                .map(|e| !matches!(e.verdict, Verdict::TooLong { .. }))
                .unwrap_or(false)
        })
    }
}

pub fn check_document(doc: &Document, config: &MetaConfig) -> MetaCheck {
    let check = |text: Option<String>, kind: MetaKind| match text {
        Some(text) => (
            Some(estimate_with(&text, kind, config.limits(kind))),
            check_keywords(&text, config.phrases(kind)),
        ),
        None => (None, Vec::new()),
    };
    let (title, title_phrases) = check(doc.title(), MetaKind::Title);
    let (description, description_phrases) = check(doc.meta_description(), MetaKind::Description);
    MetaCheck {
        file: doc.rel_path.clone(),
        title,
        title_phrases,
        description,
        description_phrases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_verdicts() {
        let ok = estimate("Metal Roofing Birmingham MI | Standing Seam | Big Cat", MetaKind::Title);
        assert_eq!(ok.chars, 53);
        assert_eq!(ok.pixels, 530);
        assert_eq!(ok.verdict, Verdict::Optimal);

        let long = estimate(
            "Metal Roofing Birmingham MI | Standing Seam Installation Troy | Big Cat Roofing",
            MetaKind::Title,
        );
        assert_eq!(long.chars, 79);
        assert_eq!(long.verdict, Verdict::TooLong { over_px: 210 });
    }

    #[test]
    fn test_borderline_when_chars_exceed_guideline_only() {
        let limits = MetaLimits {
            max_chars: 5,
            max_pixels: 100,
            optimal_range: "4-5 characters".into(),
        };
        let e = estimate_with("abcdef", MetaKind::Title, &limits);
        assert_eq!(e.verdict, Verdict::Borderline);
    }

    #[test]
    fn test_description_limit_is_1000px() {
        let e = estimate(&"x".repeat(100), MetaKind::Description);
        assert_eq!(e.verdict, Verdict::Optimal);
        let e = estimate(&"x".repeat(101), MetaKind::Description);
        assert_eq!(e.verdict, Verdict::TooLong { over_px: 10 });
    }

    #[test]
    fn test_check_keywords_case_insensitive() {
        let got = check_keywords("Standing Seam | Big Cat", &["standing seam", "troy"]);
        assert!(got[0].present);
        assert!(!got[1].present);
    }

    #[test]
    fn test_check_document() {
        let doc = Document::from_markup(
            "metal-roofing.html",
            r#"<head><title>Metal Roofing Troy</title>
            <meta name="description" content="Standing seam roofs."></head>"#,
        );
        let config = MetaConfig {
            title_phrases: vec!["troy".into()],
            ..Default::default()
        };
        let check = check_document(&doc, &config);
        assert!(check.passes());
        assert_eq!(check.title.as_ref().map(|t| t.chars), Some(18));
        assert_eq!(check.title_phrases[0].present, true);
        assert_eq!(check.description.as_ref().map(|d| d.pixels), Some(200));

        let bare = check_document(&Document::from_markup("x.html", "<p>x</p>"), &config);
        assert!(!bare.passes());
    }
}
