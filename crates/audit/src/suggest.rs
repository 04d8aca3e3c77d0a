// ABOUTME: Data-driven suggestions for placing missing title keywords into page content.
// ABOUTME: Structural hints (H1, opening paragraph) plus configurable term rules with {word} templates.

use serde::{Deserialize, Serialize};

/// A term rule: when any `terms` entry occurs inside a missing keyword, emit `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRule {
    pub terms: Vec<String>,
    pub message: String,
}

impl TermRule {
    pub fn new<I, S>(terms: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    fn matches(&self, word: &str) -> bool {
        self.terms.iter().any(|t| word.contains(t.as_str()))
    }
}

/// Suggestion templates. `{word}` is replaced by the missing keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionRules {
    pub heading_message: Option<String>,
    pub paragraph_message: Option<String>,
    pub terms: Vec<TermRule>,
}

impl Default for SuggestionRules {
    fn default() -> Self {
        Self {
            heading_message: Some("Consider adding '{word}' to the H1 heading".to_string()),
            paragraph_message: Some(
                "Add '{word}' to the opening paragraph for better SEO".to_string(),
            ),
            terms: vec![
                TermRule::new(
                    ["service", "repair"],
                    "Mention '{word}' in the services overview section",
                ),
                TermRule::new(
                    ["commercial", "residential"],
                    "Highlight '{word}' in the appropriate customer segment section",
                ),
            ],
        }
    }
}

fn render(template: &str, word: &str) -> String {
    template.replace("{word}", word)
}

/// Builds suggestions for the missing keywords of one page.
///
/// `h1` and `first_paragraph` are the lowercased texts of the page's first
/// heading and paragraph, when present. Heading hints come first, then
/// paragraph hints, then at most one term hint per keyword.
pub fn suggest(
    missing: &[String],
    h1: Option<&str>,
    first_paragraph: Option<&str>,
    rules: &SuggestionRules,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let (Some(h1), Some(template)) = (h1, rules.heading_message.as_deref()) {
        for word in missing.iter().filter(|w| !h1.contains(w.as_str())) {
            suggestions.push(render(template, word));
        }
    }

    if let (Some(para), Some(template)) = (first_paragraph, rules.paragraph_message.as_deref()) {
        for word in missing.iter().filter(|w| !para.contains(w.as_str())) {
            suggestions.push(render(template, word));
        }
    }

    for word in missing {
        if let Some(rule) = rules.terms.iter().find(|r| r.matches(word)) {
            suggestions.push(render(&rule.message, word));
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_structural_then_term_suggestions() {
        let rules = SuggestionRules::default();
        let got = suggest(
            &words(&["repair", "troy"]),
            Some("roof repair experts"),
            Some("welcome"),
            &rules,
        );
        assert_eq!(
            got,
            vec![
                "Consider adding 'troy' to the H1 heading",
                "Add 'repair' to the opening paragraph for better SEO",
                "Add 'troy' to the opening paragraph for better SEO",
                "Mention 'repair' in the services overview section",
            ]
        );
    }

    #[test]
    fn test_custom_term_rules_and_missing_structure() {
        let rules = SuggestionRules {
            heading_message: None,
            paragraph_message: None,
            terms: vec![
                TermRule::new(["roof"], "Emphasize '{word}' in service descriptions"),
                TermRule::new(["michigan", "troy"], "Include '{word}' in location sections"),
            ],
        };
        let got = suggest(&words(&["roofing", "troy", "seam"]), None, None, &rules);
        assert_eq!(
            got,
            vec![
                "Emphasize 'roofing' in service descriptions",
                "Include 'troy' in location sections",
            ]
        );
    }

    #[test]
    fn test_no_heading_means_no_heading_hints() {
        let got = suggest(&words(&["seam"]), None, Some("seam"), &SuggestionRules::default());
        assert!(got.is_empty());
    }
}
